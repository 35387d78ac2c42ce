//! Message bridge between a session and its display surface

pub mod gate;
pub mod protocol;
pub mod surface;

pub use gate::ReadyGate;
pub use protocol::{InboundMessage, OutboundMessage, decode_inbound};
pub use surface::{ChannelSurface, DisplaySurface, JsonLinesSurface};
