use serde::{Deserialize, Serialize};

/// Authoritative session status.
///
/// `Speaking` is reachable only through the host signalling active playback
/// ([`crate::VoiceClient::set_speaking`]); no capture or backend transition
/// ever sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No channel, or the channel was lost.
    Disconnected,
    /// `connect()` in flight.
    Connecting,
    /// Connected and waiting.
    Idle,
    /// Capturing audio and running VAD ticks.
    Listening,
    /// An utterance was sent; waiting on the backend.
    Thinking,
    /// Host is playing backend audio.
    Speaking,
}

impl SessionStatus {
    /// Whether the channel is up in this status.
    pub fn is_connected(&self) -> bool {
        !matches!(self, SessionStatus::Disconnected | SessionStatus::Connecting)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, SessionStatus::Listening)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Idle => "idle",
            SessionStatus::Listening => "listening",
            SessionStatus::Thinking => "thinking",
            SessionStatus::Speaking => "speaking",
        };
        write!(f, "{}", name)
    }
}

/// Role announced to the backend in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Doll,
    Dev,
    Guardian,
}

/// Persona mode attached to outbound text and audio input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaMode {
    #[default]
    Child,
    Senior,
}
