//! Live audio relay: WebSocket handler and protocol envelopes.

mod handler;
pub mod messages;

pub use handler::live_handler;
pub use messages::{ClientEnvelope, ControlAction, MessageRoute, RelayStatus, ServerEnvelope};
