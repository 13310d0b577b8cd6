//! Infrastructure layer for the client.
//!
//! Contains the adapters that touch the outside world: the WebSocket
//! connection, media sources, playback surfaces, and files on disk.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vstream_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – `WsConnector`, the tokio-tungstenite implementation of
//!   the session's `Connector` trait.  A reader task turns inbound WebSocket
//!   messages into session events; a writer task sends queued frames in
//!   order.
//!
//! - **`capture`** – `FileMediaSource` (replays a file or reads an encoder
//!   pipe on stdin) and `MockMediaSource` for tests.
//!
//! - **`playback`** – `FileSurface`, which writes received media to a file
//!   or stdout so an external player can consume it.
//!
//! - **`storage`** – the TOML application config and the saved channel
//!   credentials.

pub mod capture;
pub mod network;
pub mod playback;
pub mod storage;
