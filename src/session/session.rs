use super::{PersonaMode, Role, SessionStatus};
use crate::config::VadSettings;
use crate::events::{ClientEvent, EventDispatcher, SettingsEvent};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Live session state shared between the capture controller, the connection
/// layer, and the public client.
///
/// All methods take short, synchronous critical sections; nothing awaits
/// while the lock is held. Status events are emitted only on edges.
pub struct SharedSession {
    dispatcher: Arc<EventDispatcher>,
    state: Mutex<State>,
}

struct State {
    status: SessionStatus,
    device_id: String,
    role: Role,
    mode: PersonaMode,
    vad: VadSettings,
    noise_floor: Option<f32>,
}

impl SharedSession {
    pub fn new(
        device_id: String,
        role: Role,
        mode: PersonaMode,
        vad: VadSettings,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            dispatcher,
            state: Mutex::new(State {
                status: SessionStatus::Disconnected,
                device_id,
                role,
                mode,
                vad,
                noise_floor: None,
            }),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    /// Set the status, emitting a status event only when the value changes.
    /// Returns whether an edge occurred.
    pub fn set_status(&self, status: SessionStatus) -> bool {
        let changed = {
            let mut state = self.lock();
            if state.status == status {
                false
            } else {
                debug!("status {} -> {}", state.status, status);
                state.status = status;
                true
            }
        };
        if changed {
            self.dispatcher.emit(ClientEvent::Status(status));
        }
        changed
    }

    pub fn device_id(&self) -> String {
        self.lock().device_id.clone()
    }

    pub fn role(&self) -> Role {
        self.lock().role
    }

    pub fn mode(&self) -> PersonaMode {
        self.lock().mode
    }

    pub fn set_mode(&self, mode: PersonaMode) {
        self.lock().mode = mode;
    }

    /// Snapshot the VAD settings and noise floor for one evaluation tick.
    pub fn vad_snapshot(&self) -> (VadSettings, Option<f32>) {
        let state = self.lock();
        (state.vad.clone(), state.noise_floor)
    }

    pub fn set_noise_floor(&self, floor: f32) {
        self.lock().noise_floor = Some(floor);
    }

    /// Merge a backend settings push into the live configuration. Fields the
    /// backend did not send are left as they are.
    pub fn apply_settings(&self, settings: &SettingsEvent) {
        let mut state = self.lock();
        if let Some(mode) = settings.mode {
            state.mode = mode;
        }
        if let Some(sensitivity) = settings.vad_sensitivity {
            state.vad.sensitivity = sensitivity.clamp(1, 10);
        }
        if let Some(auto) = settings.vad_auto_calibrate {
            state.vad.auto_calibrate = auto;
        }
        if let Some(timeout) = settings.vad_timeout_ms {
            state.vad.timeout_ms = timeout;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("session lock poisoned")
    }
}
