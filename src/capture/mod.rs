//! Capture lifecycle: microphone acquisition, VAD-driven segmentation, and
//! the decision whether a finalized recording is a real utterance.

mod backend;
mod controller;
mod wav;

pub use backend::{AudioCapture, CaptureControl, CaptureHandle, EnergyProbe};
pub use controller::{CaptureController, MIN_UTTERANCE_BYTES, RESTART_DEBOUNCE};
pub use wav::WavFileCapture;
