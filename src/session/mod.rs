//! Session state: the single authoritative status value plus the live
//! configuration the VAD and connection layers read.

mod session;
mod status;

pub use session::SharedSession;
pub use status::{PersonaMode, Role, SessionStatus};
