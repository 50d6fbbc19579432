//! Energy-based voice activity detection.
//!
//! The engine consumes one scalar energy reading (0-255 range) per 100 ms
//! tick and turns it into voice/silence signals using either a
//! sensitivity-derived threshold pair or thresholds sitting above a learned
//! noise floor. It is a pure state machine: the clock is passed in, which
//! keeps every transition deterministic under test.

use crate::config::VadSettings;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cadence at which the capture controller drives [`VadEngine::evaluate`].
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Utterances shorter than this are treated as noise blips.
pub const MIN_SPEECH_DURATION: Duration = Duration::from_millis(400);

/// Noise floor assumed until calibration has learned a real one.
pub const DEFAULT_NOISE_FLOOR: f32 = 10.0;

/// EMA weight kept by the old floor estimate each learning step.
const NOISE_FLOOR_DECAY: f32 = 0.95;

/// Derived threshold pair. Recomputed from the session on every tick and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadThresholds {
    /// Below this the signal counts as silence.
    pub silence: f32,
    /// Above this the signal counts as voice. Readings between the two are
    /// a hysteresis band and cause no transition.
    pub voice: f32,
}

impl VadThresholds {
    pub fn derive(settings: &VadSettings, noise_floor: Option<f32>) -> Self {
        if settings.auto_calibrate {
            let floor = noise_floor.unwrap_or(DEFAULT_NOISE_FLOOR);
            Self {
                silence: floor + 15.0,
                voice: floor + 20.0,
            }
        } else {
            let base = (35.0 - settings.sensitivity as f32 * 3.0).max(5.0);
            Self {
                silence: base,
                voice: base + 5.0,
            }
        }
    }
}

/// Outcome of one evaluation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VadTick {
    /// No voice yet, nothing pending.
    Quiet,
    /// Energy crossed the voice threshold for the first time.
    VoiceStarted,
    /// Voice previously detected; no transition this tick.
    Active,
    /// Energy fell under the silence threshold; the silence deadline is now
    /// armed.
    SilenceArmed,
    /// The deadline expired but the speech was too short; voice state was
    /// reset and listening continues.
    NoiseBlip,
    /// The deadline expired after qualifying speech; capture should stop.
    UtteranceComplete { speech: Duration },
}

/// Per-capture VAD state. One engine lives exactly as long as its capture
/// session; a fresh capture gets a fresh engine.
#[derive(Debug)]
pub struct VadEngine {
    voice_detected: bool,
    started_at: Option<Instant>,
    silence_deadline: Option<Instant>,
}

impl VadEngine {
    pub fn new() -> Self {
        Self {
            voice_detected: false,
            started_at: None,
            silence_deadline: None,
        }
    }

    pub fn voice_detected(&self) -> bool {
        self.voice_detected
    }

    /// Time since the utterance started, zero when no voice was detected.
    pub fn speech_duration(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.duration_since(start))
            .unwrap_or_default()
    }

    /// Process one energy reading.
    ///
    /// The armed deadline is checked before the new reading: a one-shot
    /// timer would have fired between ticks, so expiry takes precedence
    /// over whatever the signal does now.
    pub fn evaluate(
        &mut self,
        energy: f32,
        now: Instant,
        settings: &VadSettings,
        noise_floor: Option<f32>,
    ) -> VadTick {
        if self.voice_detected {
            if let Some(deadline) = self.silence_deadline {
                if now >= deadline {
                    self.silence_deadline = None;
                    let speech = self.speech_duration(now);
                    if speech >= MIN_SPEECH_DURATION {
                        debug!("utterance complete after {:?} of speech", speech);
                        return VadTick::UtteranceComplete { speech };
                    }
                    // Too short to be speech: reset and keep listening.
                    debug!("noise blip ({:?}), continuing to listen", speech);
                    self.voice_detected = false;
                    self.started_at = None;
                    return VadTick::NoiseBlip;
                }
            }
        }

        let thresholds = VadThresholds::derive(settings, noise_floor);

        if energy > thresholds.voice && !self.voice_detected {
            self.voice_detected = true;
            self.started_at = Some(now);
            self.silence_deadline = None;
            debug!("voice detected (energy {:.1} > {:.1})", energy, thresholds.voice);
            return VadTick::VoiceStarted;
        }

        if energy < thresholds.silence && self.voice_detected && self.silence_deadline.is_none() {
            let deadline = now + Duration::from_millis(settings.timeout_ms);
            self.silence_deadline = Some(deadline);
            debug!("silence under {:.1}, arming {}ms deadline", thresholds.silence, settings.timeout_ms);
            return VadTick::SilenceArmed;
        }

        if self.voice_detected {
            VadTick::Active
        } else {
            VadTick::Quiet
        }
    }
}

impl Default for VadEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold one non-voiced reading into the noise floor estimate.
pub fn learn_noise_floor(current: Option<f32>, energy: f32) -> f32 {
    let floor = current.unwrap_or(DEFAULT_NOISE_FLOOR);
    floor * NOISE_FLOOR_DECAY + energy * (1.0 - NOISE_FLOOR_DECAY)
}
