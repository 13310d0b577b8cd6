//! vstream-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does vstream-client do? (for beginners)
//!
//! A client holds one WebSocket connection to a VStream server per
//! *session*.  A session either publishes or watches:
//!
//! 1. **Publish** – a local media source (an encoder writing to a pipe, or a
//!    file) produces encoded segments at a fixed cadence.  Each non-empty
//!    segment is sent to the server as one binary frame.
//! 2. **Watch** – the server sends binary frames; the client appends each one
//!    to a growing buffer and hands the buffer to a playback surface.
//!
//! In both roles the client sends a tiny `"h"` heartbeat every 20 seconds so
//! idle proxies do not drop the connection, and it reports any `"ERROR:..."`
//! text frame from the server to its observers.
//!
//! The session itself is a small state machine
//! (`CONNECTING → OPEN → CLOSED`) that runs on its own Tokio task.  Every
//! timer tick, captured segment, and network message is turned into an event
//! and handled in order by that one task, which is what makes closing the
//! session idempotent and race-free.

/// Application layer: the transport session, heartbeat, and capture adapter.
pub mod application;

/// Infrastructure layer: WebSocket connector, media sources, playback
/// surfaces, and on-disk storage.
pub mod infrastructure;
