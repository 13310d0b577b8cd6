//! Playback surfaces for the watch role.

pub mod file;

pub use file::FileSurface;
