use super::backend::AudioCapture;
use super::CaptureHandle;
use crate::connection::Connection;
use crate::error::{CaptureError, ErrorKind};
use crate::events::{ClientEvent, ErrorEvent, EventDispatcher};
use crate::session::{SessionStatus, SharedSession};
use crate::vad::{self, VadEngine, VadTick, MIN_SPEECH_DURATION, TICK_INTERVAL};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Finalized recordings at or below this size are discarded as noise.
pub const MIN_UTTERANCE_BYTES: usize = 2000;

/// Delay before listening restarts after a discarded recording.
pub const RESTART_DEBOUNCE: Duration = Duration::from_millis(500);

/// Owns the capture lifecycle: acquire, sample at the VAD cadence, finalize,
/// release. At most one capture is alive at a time; the sampler task and the
/// restart debounce are the only timers, and both handles live here so
/// cancellation is total.
pub struct CaptureController {
    session: Arc<SharedSession>,
    dispatcher: Arc<EventDispatcher>,
    connection: Arc<Connection>,
    backend: Mutex<Box<dyn AudioCapture>>,
    active: Mutex<Option<ActiveCapture>>,
    sampler: Mutex<Option<JoinHandle<()>>>,
    restart: Mutex<Option<JoinHandle<()>>>,
}

struct ActiveCapture {
    handle: CaptureHandle,
    engine: VadEngine,
    fragments: Vec<Vec<u8>>,
}

impl CaptureController {
    pub fn new(
        backend: Box<dyn AudioCapture>,
        session: Arc<SharedSession>,
        dispatcher: Arc<EventDispatcher>,
        connection: Arc<Connection>,
    ) -> Self {
        Self {
            session,
            dispatcher,
            connection,
            backend: Mutex::new(backend),
            active: Mutex::new(None),
            sampler: Mutex::new(None),
            restart: Mutex::new(None),
        }
    }

    /// Begin a capture session. Warned no-op while disconnected or already
    /// listening; a permission denial emits an error event and leaves the
    /// session Idle.
    pub async fn start_listening(self: Arc<Self>) {
        if !self.connection.is_connected() {
            warn!("start_listening ignored: not connected");
            return;
        }
        if self.session.status().is_listening() {
            warn!("start_listening ignored: already listening");
            return;
        }
        if self.active.lock().await.is_some() {
            warn!("start_listening ignored: capture still finalizing");
            return;
        }

        let handle = match self.backend.lock().await.acquire().await {
            Ok(handle) => handle,
            Err(err) => {
                self.session.set_status(SessionStatus::Idle);
                let kind = match &err {
                    CaptureError::PermissionDenied => ErrorKind::Permission,
                    _ => ErrorKind::Device,
                };
                let message = err.to_string();
                warn!("capture acquisition failed: {}", message);
                self.dispatcher.emit(ClientEvent::Error(ErrorEvent {
                    kind,
                    code: None,
                    message,
                }));
                return;
            }
        };

        {
            let mut active = self.active.lock().await;
            *active = Some(ActiveCapture {
                handle,
                engine: VadEngine::new(),
                fragments: Vec::new(),
            });
        }

        self.clone().spawn_sampler().await;
        self.session.set_status(SessionStatus::Listening);
        info!("listening");
    }

    /// Stop the capture session. Idempotent: a second call finds nothing to
    /// release and does nothing.
    pub async fn stop_listening(self: Arc<Self>) {
        // Cancel the sampling schedule before touching the audio resources
        // so no late tick fires against a released capture. The silence
        // deadline lives in the engine state and dies with it.
        if let Some(task) = self.sampler.lock().await.take() {
            task.abort();
        }
        self.finalize().await;
    }

    /// Cancel a pending debounced restart. Used on disconnect.
    pub async fn cancel_restart(&self) {
        if let Some(task) = self.restart.lock().await.take() {
            task.abort();
        }
    }

    async fn spawn_sampler(self: Arc<Self>) {
        let controller = Arc::clone(&self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; skip it so the
            // first reading lands one cadence after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let tick = {
                    let mut guard = controller.active.lock().await;
                    let Some(active) = guard.as_mut() else { break };

                    while let Ok(chunk) = active.handle.chunks.try_recv() {
                        active.fragments.push(chunk);
                    }

                    let energy = active.handle.probe.sample();
                    let (settings, floor) = controller.session.vad_snapshot();
                    if settings.auto_calibrate && !active.engine.voice_detected() {
                        controller
                            .session
                            .set_noise_floor(vad::learn_noise_floor(floor, energy));
                    }
                    active.engine.evaluate(energy, Instant::now(), &settings, floor)
                };

                if let VadTick::UtteranceComplete { speech } = tick {
                    debug!("utterance ended after {:?}, finalizing", speech);
                    // This task ends here; drop its own handle entry before
                    // finalizing so stop_listening has nothing to abort.
                    controller.sampler.lock().await.take();
                    controller.clone().finalize().await;
                    break;
                }
            }
        });
        *self.sampler.lock().await = Some(task);
    }

    /// Release the capture and decide what the recording was: a qualifying
    /// utterance is handed to the connection and the session moves to
    /// Thinking; anything else moves the session to Idle and schedules a
    /// debounced listen restart.
    ///
    /// Boxed: finalize reaches start_listening through the restart task,
    /// and that async cycle needs an indirection somewhere.
    fn finalize(self: Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(self.finalize_inner())
    }

    async fn finalize_inner(self: Arc<Self>) {
        let Some(mut active) = self.active.lock().await.take() else {
            debug!("finalize: no active capture");
            return;
        };

        let voice_detected = active.engine.voice_detected();
        let speech = active.engine.speech_duration(Instant::now());

        if let Err(err) = active.handle.control.stop().await {
            warn!("capture stop failed: {}", err);
        }
        // The sender is closed once stop resolves; drain what was flushed.
        while let Some(chunk) = active.handle.chunks.recv().await {
            active.fragments.push(chunk);
        }
        let audio: Vec<u8> = active.fragments.concat();

        let qualifies = voice_detected
            && audio.len() > MIN_UTTERANCE_BYTES
            && speech >= MIN_SPEECH_DURATION;

        if qualifies {
            info!(
                "utterance qualified: {} bytes, {:?} of speech",
                audio.len(),
                speech
            );
            self.session.set_status(SessionStatus::Thinking);
            let mime_type = active.handle.mime_type.clone();
            let mode = self.session.mode();
            // Fire-and-forget: transmission is neither acknowledged nor
            // retried at this layer.
            if let Err(err) = self.connection.send_audio(&audio, &mime_type, mode).await {
                warn!("failed to transmit utterance: {}", err);
            }
        } else {
            debug!(
                "recording discarded (voice={}, {} bytes, {:?} of speech)",
                voice_detected,
                audio.len(),
                speech
            );
            self.session.set_status(SessionStatus::Idle);
            self.schedule_restart().await;
        }
    }

    async fn schedule_restart(self: Arc<Self>) {
        let controller = Arc::clone(&self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(RESTART_DEBOUNCE).await;
            if controller.connection.is_connected() {
                controller.start_listening().await;
            } else {
                debug!("skipping listen restart while disconnected");
            }
        });
        if let Some(old) = self.restart.lock().await.replace(task) {
            old.abort();
        }
    }
}
