//! Channel management and wire translation: handshake on link-up, inbound
//! frames to typed domain events, outbound requests to wire messages.

mod channel;
mod connection;
mod nats;
mod wire;

pub use channel::{Channel, ChannelEvent};
pub use connection::Connection;
pub use nats::NatsChannel;
pub use wire::{ClientMessage, ServerMessage};
