//! Domain entities for VStream clients.
//!
//! This module contains pure logic with no infrastructure dependencies: no
//! sockets, no timers, no file system.  Everything here can be compiled and
//! tested on any platform without external setup.
//!
//! - [`session`] – who a session is (channel, key, role) and which lifecycle
//!   state it can be in.
//! - [`chunk_sink`] – the watch-side reassembler that concatenates received
//!   media segments into one playable buffer.
//! - [`resolutions`] / [`previews`] – string codecs for the channel settings
//!   the server stores as plain text.
//! - [`playback_time`] – `HH:MM:SS` rendering of playback offsets.

pub mod chunk_sink;
pub mod playback_time;
pub mod previews;
pub mod resolutions;
pub mod session;
