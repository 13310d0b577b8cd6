//! On-disk state of the client.
//!
//! - [`config`] – `config.toml`: server URLs, session timing, log level.
//! - [`channels`] – `channels.toml`: credentials of channels the user has
//!   created or published to before.
//!
//! Both files live in the same platform config directory.

pub mod channels;
pub mod config;
