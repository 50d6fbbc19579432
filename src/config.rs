use crate::session::{PersonaMode, Role};
use anyhow::Result;
use serde::Deserialize;

/// Client configuration.
///
/// Every field except `server_url` has a default; defaults are resolved once
/// by [`ClientConfig::resolve`] at client construction and never re-derived.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend URL the channel transport connects to.
    pub server_url: String,

    /// Optional API key forwarded to the transport.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Stable device identifier. Generated and persisted through the
    /// key-value store when absent.
    #[serde(default)]
    pub device_id: Option<String>,

    /// Role announced in the handshake.
    #[serde(default)]
    pub role: Role,

    /// Persona mode sent with text and audio input.
    #[serde(default)]
    pub mode: PersonaMode,

    #[serde(default)]
    pub vad: VadSettings,

    /// Whether the transport should reconnect on its own after a drop.
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Bounded reconnect attempts before the transport gives up.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: usize,
}

/// Voice activity detection tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct VadSettings {
    /// Sensitivity 1-10; higher reacts to quieter speech. Clamped by
    /// [`ClientConfig::resolve`].
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,

    /// Derive thresholds from the learned noise floor instead of the
    /// sensitivity formula.
    #[serde(default = "default_auto_calibrate")]
    pub auto_calibrate: bool,

    /// Silence duration that ends an utterance, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_sensitivity() -> u8 {
    5
}

fn default_auto_calibrate() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    700
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_attempts() -> usize {
    5
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            auto_calibrate: default_auto_calibrate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the URL.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: None,
            device_id: None,
            role: Role::default(),
            mode: PersonaMode::default(),
            vad: VadSettings::default(),
            auto_reconnect: default_auto_reconnect(),
            reconnect_attempts: default_reconnect_attempts(),
        }
    }

    /// Load configuration from a file (TOML/JSON/YAML per extension).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        Ok(cfg.resolve())
    }

    /// Normalize out-of-range values. Called once at construction.
    pub fn resolve(mut self) -> Self {
        self.vad.sensitivity = self.vad.sensitivity.clamp(1, 10);
        self
    }
}
