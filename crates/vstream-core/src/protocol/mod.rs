//! Protocol module containing the frame model and endpoint layout.

pub mod endpoint;
pub mod frames;

pub use endpoint::{session_url, EndpointError};
pub use frames::{ControlMessage, Frame, ERROR_MARKER, HEARTBEAT};
