use super::backend::{AudioCapture, CaptureControl, CaptureHandle, EnergyProbe};
use crate::error::CaptureError;
use async_trait::async_trait;
use hound::WavReader;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::info;

/// Scale factor that maps PCM RMS onto the 0-255 energy range the VAD
/// thresholds are tuned for.
const ENERGY_GAIN: f32 = 4.0;

/// File-backed capture capability.
///
/// Plays the role of microphone plus encoder for demos and integration
/// tests: each probe sample consumes one 100 ms window of the file,
/// reporting its RMS energy and emitting its PCM bytes as a fragment.
pub struct WavFileCapture {
    path: PathBuf,
}

struct Window {
    energy: f32,
    pcm: Vec<u8>,
}

struct Playback {
    windows: VecDeque<Window>,
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

struct WavProbe {
    playback: Arc<Mutex<Playback>>,
}

struct WavControl {
    playback: Arc<Mutex<Playback>>,
}

impl WavFileCapture {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_windows(path: &Path) -> Result<(VecDeque<Window>, u32), CaptureError> {
        let reader = WavReader::open(path)
            .map_err(|e| CaptureError::Device(format!("open {}: {}", path.display(), e)))?;
        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CaptureError::Device(format!("read samples: {}", e)))?;

        // One window per VAD tick.
        let window_len = (spec.sample_rate as usize / 10).max(1) * spec.channels as usize;
        let windows = samples
            .chunks(window_len)
            .map(|chunk| {
                let sum_squares: f64 = chunk.iter().map(|&s| (s as f64).powi(2)).sum();
                let rms = (sum_squares / chunk.len() as f64).sqrt() as f32;
                let energy = (rms / i16::MAX as f32 * 255.0 * ENERGY_GAIN).min(255.0);
                let pcm = chunk.iter().flat_map(|s| s.to_le_bytes()).collect();
                Window { energy, pcm }
            })
            .collect();

        Ok((windows, spec.sample_rate))
    }
}

#[async_trait]
impl AudioCapture for WavFileCapture {
    async fn acquire(&mut self) -> Result<CaptureHandle, CaptureError> {
        let (windows, sample_rate) = Self::read_windows(&self.path)?;
        info!(
            "wav capture ready: {} windows from {}",
            windows.len(),
            self.path.display()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let playback = Arc::new(Mutex::new(Playback {
            windows,
            tx: Some(tx),
        }));

        Ok(CaptureHandle {
            chunks: rx,
            mime_type: format!("audio/pcm;rate={}", sample_rate),
            probe: Box::new(WavProbe {
                playback: Arc::clone(&playback),
            }),
            control: Box::new(WavControl { playback }),
        })
    }
}

impl EnergyProbe for WavProbe {
    fn sample(&mut self) -> f32 {
        let mut playback = self.playback.lock().expect("playback lock poisoned");
        match playback.windows.pop_front() {
            Some(window) => {
                if let Some(tx) = &playback.tx {
                    let _ = tx.send(window.pcm);
                }
                window.energy
            }
            // File exhausted: report silence until the controller stops.
            None => 0.0,
        }
    }
}

#[async_trait]
impl CaptureControl for WavControl {
    async fn stop(&mut self) -> Result<(), CaptureError> {
        // Dropping the sender closes the chunk channel; fragments already
        // sent stay readable until drained.
        let mut playback = self.playback.lock().expect("playback lock poisoned");
        playback.tx.take();
        Ok(())
    }
}
