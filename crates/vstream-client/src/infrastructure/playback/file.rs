//! File-backed playback surface.
//!
//! The session hands the surface the full reassembled buffer after every
//! chunk.  A file only ever grows, so this surface writes just the newly
//! appended chunk; the file on disk is then byte-for-byte the reassembled
//! buffer.  Writing `-` streams to stdout for a player reading a pipe
//! (`vstream watch ... -o - | ffplay -`).
//!
//! Disk I/O happens on a writer task fed through a channel so `present`
//! never blocks the session task.

use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::session::{PlaybackSurface, PlaybackUpdate};

type Output = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes received media to a file or stdout.
pub struct FileSurface {
    label: String,
    chunks: Option<UnboundedSender<Vec<u8>>>,
    writer: Option<JoinHandle<()>>,
}

impl FileSurface {
    /// Creates (or truncates) `path`.  `-` selects stdout.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if path == Path::new("-") {
            return Ok(Self::from_writer("stdout", tokio::io::stdout()));
        }
        let file = std::fs::File::create(path)?;
        Ok(Self::from_writer(
            path.display().to_string(),
            tokio::fs::File::from_std(file),
        ))
    }

    /// Wraps any async writer.
    pub fn from_writer(label: impl Into<String>, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        let label = label.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let mut output: Output = Box::new(writer);
        let task_label = label.clone();

        let writer = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                if let Err(e) = output.write_all(&chunk).await {
                    warn!("playback '{task_label}': write failed: {e}");
                    return;
                }
            }
            if let Err(e) = output.flush().await {
                warn!("playback '{task_label}': flush failed: {e}");
            }
            debug!("playback '{task_label}': writer finished");
        });

        Self {
            label,
            chunks: Some(tx),
            writer: Some(writer),
        }
    }

    /// Takes the writer task handle.
    ///
    /// The task ends once the surface has been released or dropped and every
    /// presented chunk is on disk, so awaiting it after the session closes
    /// guarantees the output is complete.
    pub fn take_writer(&mut self) -> Option<JoinHandle<()>> {
        self.writer.take()
    }
}

impl PlaybackSurface for FileSurface {
    fn present(&mut self, update: PlaybackUpdate<'_>) {
        if update.chunk_count == 1 && !update.resume_at.is_zero() {
            info!("playback '{}': resuming at {:?}", self.label, update.resume_at);
        }
        if let Some(chunks) = &self.chunks {
            if chunks.send(update.chunk.to_vec()).is_err() {
                warn!("playback '{}': writer has stopped", self.label);
                self.chunks = None;
            }
        }
    }

    fn release(&mut self) {
        // Dropping the sender lets the writer drain, flush, and exit.
        self.chunks = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn update<'a>(buffer: &'a [u8], chunk: &'a [u8], count: usize) -> PlaybackUpdate<'a> {
        PlaybackUpdate {
            buffer,
            chunk,
            chunk_count: count,
            resume_at: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_file_holds_concatenated_chunks() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webm");
        let mut surface = FileSurface::create(&path).unwrap();
        let writer = surface.take_writer().unwrap();

        // Act
        surface.present(update(b"ab", b"ab", 1));
        surface.present(update(b"abcd", b"cd", 2));
        surface.release();
        writer.await.unwrap();

        // Assert
        assert_eq!(std::fs::read(&path).unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn test_present_after_release_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut surface = FileSurface::create(&path).unwrap();
        let writer = surface.take_writer().unwrap();

        surface.present(update(b"x", b"x", 1));
        surface.release();
        surface.present(update(b"xy", b"y", 2));
        drop(surface);
        writer.await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let result = FileSurface::create(Path::new("/definitely/not/here/out.bin"));
        assert!(result.is_err());
    }
}
