//! Wire message shapes. The `type` tag is snake_case, payload fields are
//! camelCase JSON.

use crate::session::{PersonaMode, Role};
use serde::{Deserialize, Serialize};

/// Messages the client sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identification sent immediately after the channel comes up.
    #[serde(rename_all = "camelCase")]
    Handshake { role: Role, device_id: String },

    #[serde(rename_all = "camelCase")]
    TextInput { text: String, mode: PersonaMode },

    /// A finalized utterance. `audio` is base64-encoded.
    #[serde(rename_all = "camelCase")]
    AudioInput {
        audio: String,
        mime_type: String,
        mode: PersonaMode,
    },
}

/// Messages the backend sends. Unknown types fail to parse and are ignored
/// by the translation layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Status { status: String },

    #[serde(rename_all = "camelCase")]
    SetSettings {
        #[serde(default)]
        mode: Option<PersonaMode>,
        #[serde(default)]
        vad_sensitivity: Option<u8>,
        #[serde(default)]
        vad_auto_calibrate: Option<bool>,
        #[serde(default)]
        vad_timeout: Option<u64>,
    },

    #[serde(rename_all = "camelCase")]
    LiveText {
        role: String,
        text: String,
        is_final: bool,
        #[serde(default)]
        user_text: Option<String>,
        #[serde(default)]
        is_filler: Option<bool>,
    },

    #[serde(rename_all = "camelCase")]
    AudioOutput {
        text: String,
        priority: i32,
        #[serde(default)]
        user_text: Option<String>,
        #[serde(default)]
        is_intercom: Option<bool>,
        #[serde(default)]
        is_filler: Option<bool>,
    },

    #[serde(rename_all = "camelCase")]
    Error { message: String },

    #[serde(rename_all = "camelCase")]
    AuthError { code: String, message: String },
}
