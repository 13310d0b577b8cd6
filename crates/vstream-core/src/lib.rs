//! # vstream-core
//!
//! Shared library for VStream clients containing the streaming frame
//! protocol, session identity types, the watch-side chunk reassembler, the
//! channel configuration codecs, and the HTTP API request builders.
//!
//! This crate is used by the client application and by anything else that
//! needs to speak to a VStream server.  It has zero dependencies on sockets,
//! timers, or an async runtime.
//!
//! # Architecture overview (for beginners)
//!
//! A VStream client either *publishes* a live media stream to a server or
//! *watches* one.  Both directions use a single WebSocket connection that
//! carries two kinds of frames:
//!
//! - **Binary frames** – opaque encoded media segments.  Their order is the
//!   only sequencing information there is.
//! - **Text frames** – tiny control signals: the `"h"` heartbeat and
//!   `"ERROR:..."` reports from the server.
//!
//! This crate defines:
//!
//! - **`protocol`** – The frame model, the control-message decoder, and the
//!   URL layout of the streaming endpoints.
//!
//! - **`domain`** – Pure types with no I/O: session identity and lifecycle
//!   states, the [`ChunkSink`] that turns received segments into a playable
//!   buffer, and the string codecs for resolution lists, preview settings,
//!   and playback offsets.
//!
//! - **`api`** – Request builders and JSON response types for the REST side
//!   of the service (channel administration, status, VOD listing).

pub mod api;
pub mod domain;
pub mod protocol;

pub use domain::chunk_sink::ChunkSink;
pub use domain::previews::PreviewsConfig;
pub use domain::resolutions::{Resolution, ResolutionList};
pub use domain::session::{Role, SessionId, SessionState};
pub use protocol::endpoint::{session_url, EndpointError};
pub use protocol::frames::{ControlMessage, Frame};
