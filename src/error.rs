//! Error types for the companion-voice client

use thiserror::Error;

/// Errors surfaced by capture capabilities.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The user (or platform) denied microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("encoder error: {0}")]
    Encoder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by channel transports.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("channel is not connected")]
    NotConnected,
}

/// Top-level client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Classification carried on error events so hosts can branch without
/// string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Microphone access denied; session falls back to Idle.
    Permission,
    /// Capture device or encoder failure; session falls back to Idle.
    Device,
    /// Transport-level failure; session becomes Disconnected.
    Connection,
    /// Backend rejected the handshake or credentials; session becomes
    /// Disconnected.
    Auth,
    /// Backend-reported error; status is left unchanged.
    Server,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Permission => "permission",
            ErrorKind::Device => "device",
            ErrorKind::Connection => "connection",
            ErrorKind::Auth => "auth",
            ErrorKind::Server => "server",
        };
        write!(f, "{}", name)
    }
}
