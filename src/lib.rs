pub mod capture;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod vad;

pub use capture::{
    AudioCapture, CaptureControl, CaptureController, CaptureHandle, EnergyProbe, WavFileCapture,
};
pub use client::VoiceClient;
pub use config::{ClientConfig, VadSettings};
pub use connection::{Channel, ChannelEvent, ClientMessage, Connection, NatsChannel, ServerMessage};
pub use error::{CaptureError, ChannelError, ClientError, ErrorKind};
pub use events::{
    AudioEvent, ClientEvent, ErrorEvent, EventDispatcher, EventKind, SettingsEvent, SubscriptionId,
    TextEvent,
};
pub use session::{PersonaMode, Role, SessionStatus, SharedSession};
pub use storage::{FileStore, KeyValueStore, DEVICE_ID_KEY};
pub use vad::{VadEngine, VadThresholds, VadTick, MIN_SPEECH_DURATION, TICK_INTERVAL};
