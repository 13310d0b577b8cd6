//! Persistent list of channels the user controls.
//!
//! Each record keeps the channel id together with its streaming key so the
//! CLI can publish without the key on the command line.  Resolutions and
//! previews are stored in their wire text form, which keeps the file easy to
//! edit by hand:
//!
//! ```toml
//! [[channels]]
//! id = "my-channel"
//! key = "s3cr3t"
//! record = true
//! resolutions = "ORIGINAL,1280x720-30"
//! previews = "256x144,30"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use vstream_core::{PreviewsConfig, ResolutionList};

use super::config::{config_dir, ConfigError};

/// Error type for channel store writes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error accessing channel store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize channel store: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A channel the user can publish to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlledChannel {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub record: bool,
    #[serde(default)]
    pub resolutions: ResolutionList,
    #[serde(default)]
    pub previews: PreviewsConfig,
}

impl ControlledChannel {
    /// A channel with original-only resolutions and previews disabled.
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            record: false,
            resolutions: ResolutionList::original_only(),
            previews: PreviewsConfig::disabled(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChannelFile {
    #[serde(default)]
    channels: Vec<ControlledChannel>,
}

/// Reads and writes `channels.toml`.
#[derive(Debug, Clone)]
pub struct ChannelStore {
    path: PathBuf,
}

impl ChannelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] if the directory cannot be
    /// determined.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(config_dir()?.join("channels.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored channels.
    ///
    /// A missing file is an empty store.  An unreadable or malformed file is
    /// logged and also treated as empty, so a damaged store never blocks
    /// publishing with an explicit key.
    pub fn get_all(&self) -> Vec<ControlledChannel> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("channel store {}: cannot read: {e}", self.path.display());
                return Vec::new();
            }
        };
        match toml::from_str::<ChannelFile>(&content) {
            Ok(file) => file.channels,
            Err(e) => {
                warn!("channel store {}: malformed, ignoring: {e}", self.path.display());
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<ControlledChannel> {
        self.get_all().into_iter().find(|c| c.id == id)
    }

    /// Replaces the record with the same id, or appends a new one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn upsert(&self, channel: ControlledChannel) -> Result<(), StoreError> {
        let mut channels = self.get_all();
        match channels.iter_mut().find(|c| c.id == channel.id) {
            Some(existing) => *existing = channel,
            None => channels.push(channel),
        }
        self.write(channels)
    }

    /// Removes the record with `id`.  Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut channels = self.get_all();
        let before = channels.len();
        channels.retain(|c| c.id != id);
        if channels.len() == before {
            return Ok(false);
        }
        self.write(channels)?;
        Ok(true)
    }

    fn write(&self, channels: Vec<ControlledChannel>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let count = channels.len();
        let content = toml::to_string_pretty(&ChannelFile { channels })?;
        std::fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("channel store {}: wrote {count} channel(s)", self.path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
