//! Application layer for the client.
//!
//! # What lives here?
//!
//! - **`session`** – The transport session: the `CONNECTING → OPEN → CLOSED`
//!   state machine, the typed events it consumes, the traits it talks to
//!   (connector, link, observer, playback surface), and the driver task that
//!   feeds it.
//!
//! - **`heartbeat`** – A periodic timer that asks the session to send the
//!   `"h"` keep-alive while it is open.
//!
//! - **`capture`** – The `MediaSource` trait and the adapter that turns a
//!   source's output into session events, dropping empty segments.
//!
//! Nothing here touches a socket or a file directly; the infrastructure
//! layer supplies those through the traits defined in this module.

pub mod capture;
pub mod heartbeat;
pub mod session;
