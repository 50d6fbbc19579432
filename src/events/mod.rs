//! Typed event surface exposed to the host application.
//!
//! Events are immutable value records. Hosts subscribe per [`EventKind`]
//! through the [`EventDispatcher`] and receive events in emission order.

mod dispatcher;

pub use dispatcher::{EventDispatcher, SubscriptionId};

use crate::error::ErrorKind;
use crate::session::{PersonaMode, SessionStatus};
use serde::{Deserialize, Serialize};

/// Text produced by the backend (live transcript or reply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEvent {
    /// What the backend heard the user say, when echoed back.
    pub user_text: Option<String>,
    /// The AI-side text.
    pub ai_text: String,
    /// False for interim updates, true once the text is stable.
    pub is_final: bool,
    /// Filler text emitted while the backend is still thinking.
    pub is_filler: bool,
}

/// Audio the host should speak, delivered as text plus rendering hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioEvent {
    pub text: String,
    /// Backend-assigned priority, passed through verbatim.
    pub priority: i32,
    pub user_text: Option<String>,
    /// Guardian intercom announcements.
    pub is_intercom: bool,
    pub is_filler: bool,
}

/// Settings pushed by the backend. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsEvent {
    pub mode: Option<PersonaMode>,
    pub vad_sensitivity: Option<u8>,
    pub vad_auto_calibrate: Option<bool>,
    pub vad_timeout_ms: Option<u64>,
}

/// A failure observable by the host. Never raised as a panic.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: String,
}

/// Everything the client can notify the host about.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    Status(SessionStatus),
    Text(TextEvent),
    Audio(AudioEvent),
    Settings(SettingsEvent),
    Error(ErrorEvent),
}

/// Subscription key for [`EventDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Status,
    Text,
    Audio,
    Settings,
    Error,
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::Connected => EventKind::Connected,
            ClientEvent::Disconnected => EventKind::Disconnected,
            ClientEvent::Status(_) => EventKind::Status,
            ClientEvent::Text(_) => EventKind::Text,
            ClientEvent::Audio(_) => EventKind::Audio,
            ClientEvent::Settings(_) => EventKind::Settings,
            ClientEvent::Error(_) => EventKind::Error,
        }
    }
}
