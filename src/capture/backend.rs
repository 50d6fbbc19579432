use crate::error::CaptureError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Periodic energy readings over the live audio stream, 0-255 compatible.
/// Sampled once per VAD tick by the capture controller.
pub trait EnergyProbe: Send {
    fn sample(&mut self) -> f32;
}

/// Handle to stop an in-flight capture.
#[async_trait]
pub trait CaptureControl: Send {
    /// Stop encoding and release the underlying audio resources.
    ///
    /// Contract: by the time this resolves, every remaining encoded
    /// fragment has been delivered on the chunk channel and its sender is
    /// closed, so draining the receiver terminates.
    async fn stop(&mut self) -> Result<(), CaptureError>;
}

/// A live capture as handed out by an [`AudioCapture`] backend.
pub struct CaptureHandle {
    /// Encoded audio fragments in production order.
    pub chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Mime type of the encoded fragments.
    pub mime_type: String,
    pub probe: Box<dyn EnergyProbe>,
    pub control: Box<dyn CaptureControl>,
}

/// Microphone acquisition plus encoding, injected by the host.
///
/// Implementations:
/// - `WavFileCapture`: reads a WAV file (demo and tests)
/// - host applications bring their own backend for real microphones
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the microphone and start encoding.
    ///
    /// Fails with [`CaptureError::PermissionDenied`] when the platform
    /// refuses microphone access.
    async fn acquire(&mut self) -> Result<CaptureHandle, CaptureError>;
}
