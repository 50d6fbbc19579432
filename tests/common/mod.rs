// Shared test doubles: a scripted capture capability and an in-memory
// channel/store, so the full client runs without hardware or a server.

#![allow(dead_code)]

use async_trait::async_trait;
use companion_voice::{
    AudioCapture, CaptureControl, CaptureError, CaptureHandle, Channel, ChannelError,
    ChannelEvent, ClientError, EnergyProbe, KeyValueStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One 100ms tick of fake signal: an energy reading plus the encoded bytes
/// the encoder would have produced for that window.
#[derive(Debug, Clone)]
pub struct Frame {
    pub energy: f32,
    pub chunk_bytes: usize,
}

pub fn frames(script: &[(f32, usize)]) -> Vec<Frame> {
    script
        .iter()
        .map(|&(energy, chunk_bytes)| Frame { energy, chunk_bytes })
        .collect()
}

enum FailMode {
    Permission,
    Device,
}

/// Capture backend that replays a fixed script on every acquisition.
pub struct ScriptedCapture {
    script: Vec<Frame>,
    fail: Option<FailMode>,
    pub acquisitions: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
}

impl ScriptedCapture {
    pub fn new(script: Vec<Frame>) -> Self {
        Self {
            script,
            fail: None,
            acquisitions: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denied() -> Self {
        Self {
            fail: Some(FailMode::Permission),
            ..Self::new(Vec::new())
        }
    }

    pub fn broken() -> Self {
        Self {
            fail: Some(FailMode::Device),
            ..Self::new(Vec::new())
        }
    }
}

struct Playback {
    frames: VecDeque<Frame>,
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

struct ScriptedProbe {
    playback: Arc<Mutex<Playback>>,
}

struct ScriptedControl {
    playback: Arc<Mutex<Playback>>,
    releases: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioCapture for ScriptedCapture {
    async fn acquire(&mut self) -> Result<CaptureHandle, CaptureError> {
        match self.fail {
            Some(FailMode::Permission) => return Err(CaptureError::PermissionDenied),
            Some(FailMode::Device) => {
                return Err(CaptureError::Device("no input device".to_string()))
            }
            None => {}
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        let playback = Arc::new(Mutex::new(Playback {
            frames: self.script.iter().cloned().collect(),
            tx: Some(tx),
        }));

        Ok(CaptureHandle {
            chunks: rx,
            mime_type: "audio/test".to_string(),
            probe: Box::new(ScriptedProbe {
                playback: Arc::clone(&playback),
            }),
            control: Box::new(ScriptedControl {
                playback,
                releases: Arc::clone(&self.releases),
            }),
        })
    }
}

impl EnergyProbe for ScriptedProbe {
    fn sample(&mut self) -> f32 {
        let mut playback = self.playback.lock().unwrap();
        match playback.frames.pop_front() {
            Some(frame) => {
                if frame.chunk_bytes > 0 {
                    if let Some(tx) = &playback.tx {
                        let _ = tx.send(vec![0u8; frame.chunk_bytes]);
                    }
                }
                frame.energy
            }
            None => 0.0,
        }
    }
}

#[async_trait]
impl CaptureControl for ScriptedControl {
    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.playback.lock().unwrap().tx.take();
        Ok(())
    }
}

/// In-memory channel: records outbound frames, lets tests inject inbound
/// events.
pub struct MemoryChannel {
    pub sent: Mutex<Vec<serde_json::Value>>,
    inbound: Mutex<Option<mpsc::Sender<ChannelEvent>>>,
    connected: AtomicBool,
    fail_connect: bool,
}

impl MemoryChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            inbound: Mutex::new(None),
            connected: AtomicBool::new(false),
            fail_connect: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            inbound: Mutex::new(None),
            connected: AtomicBool::new(false),
            fail_connect: true,
        })
    }

    pub fn sent_frames(&self) -> Vec<serde_json::Value> {
        self.sent.lock().unwrap().clone()
    }

    pub async fn inject(&self, event: ChannelEvent) {
        let tx = self
            .inbound
            .lock()
            .unwrap()
            .clone()
            .expect("channel not connected");
        tx.send(event).await.expect("event receiver dropped");
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn connect(
        &self,
        _identity: &str,
    ) -> Result<mpsc::Receiver<ChannelEvent>, ChannelError> {
        if self.fail_connect {
            return Err(ChannelError::Connect("refused".to_string()));
        }
        let (tx, rx) = mpsc::channel(64);
        tx.send(ChannelEvent::Up).await.ok();
        *self.inbound.lock().unwrap() = Some(tx);
        self.connected.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn send(&self, frame: serde_json::Value) -> Result<(), ChannelError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ChannelError::NotConnected);
        }
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.inbound.lock().unwrap().take();
    }
}

/// In-memory key-value store. Clones share state, so a test can keep a
/// handle on a store it handed to the client.
#[derive(Clone)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, String>>>,
    pub puts: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            map: Arc::new(Mutex::new(HashMap::new())),
            puts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Let spawned tasks and auto-advanced timers make progress.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
}
