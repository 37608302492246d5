//! Session transport for the Sitara runner.
//!
//! Owns the single persistent bidirectional connection to the remote
//! conversational agent: connect, send the initiation payload, dispatch
//! inbound events, answer liveness pings, and close. All outbound frames
//! are serialized through one writer; the receive loop owns every session
//! state transition.

pub mod endpoint;
pub mod protocol;
pub mod session;

pub use endpoint::resolve_connection_url;
pub use protocol::{InboundEvent, OutboundEvent};
pub use session::{OutboundSink, SessionTransport};
