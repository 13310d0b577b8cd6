//! Media sources for the publish role.
//!
//! - [`file::FileMediaSource`] reads an encoded stream from a file or from
//!   standard input (for example `ffmpeg ... -f webm - | vstream publish`).
//! - [`mock::MockMediaSource`] lets tests inject segments and device-ended
//!   signals by hand.

pub mod file;
pub mod mock;

pub use file::FileMediaSource;
pub use mock::MockMediaSource;
