//! File and pipe media source.
//!
//! The source reads whatever bytes the input provides and slices them into
//! segments on the capture cadence: every tick, everything read since the
//! previous tick becomes one segment.  This mirrors a browser media recorder
//! with a timeslice, where each slice is an arbitrary cut of the encoded
//! stream and only the concatenation is meaningful.
//!
//! At end of input the remaining bytes are flushed as a final segment and
//! the source reports [`SourceEvent::Ended`], which closes a publish session
//! gracefully.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::capture::{CaptureError, MediaSource, SourceEvent};
use crate::application::heartbeat::MIN_TIMER_PERIOD;

type Input = Box<dyn AsyncRead + Send + Unpin>;

/// Reads an encoded media stream from a file or standard input.
pub struct FileMediaSource {
    label: String,
    input: Option<Input>,
    read_chunk_bytes: usize,
    task: Option<JoinHandle<()>>,
}

impl FileMediaSource {
    /// Opens `path` for reading.  `-` selects standard input.
    ///
    /// Opening is the device acquisition step, so a missing file is reported
    /// here, before any session is created.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Open`] if the file cannot be opened.
    pub fn open(path: &Path, read_chunk_bytes: usize) -> Result<Self, CaptureError> {
        if path == Path::new("-") {
            return Ok(Self::from_reader("stdin", tokio::io::stdin(), read_chunk_bytes));
        }

        let file = std::fs::File::open(path).map_err(|source| CaptureError::Open {
            device: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_reader(
            path.display().to_string(),
            tokio::fs::File::from_std(file),
            read_chunk_bytes,
        ))
    }

    /// Wraps any async reader, e.g. the stdout of a spawned encoder.
    pub fn from_reader(
        label: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
        read_chunk_bytes: usize,
    ) -> Self {
        Self {
            label: label.into(),
            input: Some(Box::new(reader)),
            read_chunk_bytes: read_chunk_bytes.max(1),
            task: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl MediaSource for FileMediaSource {
    fn start(&mut self, cadence: Duration) -> Result<UnboundedReceiver<SourceEvent>, CaptureError> {
        let input = self
            .input
            .take()
            .ok_or_else(|| CaptureError::AlreadyStarted(self.label.clone()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let cadence = cadence.max(MIN_TIMER_PERIOD);

        info!("capture '{}' started ({} ms cadence)", self.label, cadence.as_millis());
        self.task = Some(tokio::spawn(produce(
            input,
            cadence,
            self.read_chunk_bytes,
            tx,
        )));
        Ok(rx)
    }

    fn stop(&mut self) {
        self.input = None;
        if let Some(task) = self.task.take() {
            task.abort();
            info!("capture '{}' stopped", self.label);
        }
    }
}

impl Drop for FileMediaSource {
    fn drop(&mut self) {
        self.stop();
    }
}

enum Step {
    Tick,
    Read(std::io::Result<usize>),
}

async fn produce(
    mut input: Input,
    cadence: Duration,
    read_chunk_bytes: usize,
    tx: UnboundedSender<SourceEvent>,
) {
    let mut ticker = interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut scratch = vec![0u8; read_chunk_bytes];
    let mut pending = BytesMut::new();

    loop {
        let step = tokio::select! {
            _ = ticker.tick() => Step::Tick,
            read = input.read(&mut scratch) => Step::Read(read),
        };

        match step {
            Step::Tick => {
                if !pending.is_empty() {
                    debug!("capture: segment of {} bytes", pending.len());
                    if tx.send(SourceEvent::Segment(pending.split().freeze())).is_err() {
                        return;
                    }
                }
            }
            Step::Read(Ok(0)) => break,
            Step::Read(Ok(n)) => pending.extend_from_slice(&scratch[..n]),
            Step::Read(Err(e)) => {
                warn!("capture read failed: {e}");
                break;
            }
        }
    }

    if !pending.is_empty() {
        let _ = tx.send(SourceEvent::Segment(pending.freeze()));
    }
    let _ = tx.send(SourceEvent::Ended);
}

/// Resolves the `--input` argument: `None` means standard input.
pub fn input_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| PathBuf::from("-"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_open_missing_file_fails_before_start() {
        let result = FileMediaSource::open(Path::new("/definitely/not/here.webm"), 1024);
        assert!(matches!(result, Err(CaptureError::Open { .. })));
    }

    #[tokio::test]
    async fn test_file_contents_arrive_then_ended() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();
        let mut source = FileMediaSource::open(file.path(), 4).unwrap();

        // Act
        let mut rx = source.start(Duration::from_millis(10)).unwrap();
        let mut received = Vec::new();
        let mut ended = false;
        while let Some(event) = rx.recv().await {
            match event {
                SourceEvent::Segment(data) => received.extend_from_slice(&data),
                SourceEvent::Ended => {
                    ended = true;
                    break;
                }
            }
        }

        // Assert
        assert_eq!(received, b"0123456789");
        assert!(ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_segment_per_tick() {
        // Arrange: a pipe we write to by hand.
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut source = FileMediaSource::from_reader("pipe", reader, 64);
        let mut rx = source.start(Duration::from_millis(500)).unwrap();

        // Act
        writer.write_all(b"ab").await.unwrap();
        writer.write_all(b"cd").await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        writer.write_all(b"ef").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert_eq!(rx.recv().await, Some(SourceEvent::Segment(bytes::Bytes::from_static(b"abcd"))));
        assert_eq!(rx.recv().await, Some(SourceEvent::Segment(bytes::Bytes::from_static(b"ef"))));
        source.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_cadence_still_produces_segments() {
        // Arrange
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut source = FileMediaSource::from_reader("pipe", reader, 16);
        let mut rx = source.start(Duration::ZERO).unwrap();

        // Act
        writer.write_all(b"xyz").await.unwrap();
        tokio::time::sleep(MIN_TIMER_PERIOD * 3).await;

        // Assert
        assert_eq!(rx.recv().await, Some(SourceEvent::Segment(bytes::Bytes::from_static(b"xyz"))));
        source.stop();
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let (_writer, reader) = tokio::io::duplex(16);
        let mut source = FileMediaSource::from_reader("pipe", reader, 16);

        let _rx = source.start(Duration::from_millis(500)).unwrap();

        assert!(matches!(
            source.start(Duration::from_millis(500)),
            Err(CaptureError::AlreadyStarted(_))
        ));
    }

    #[test]
    fn test_input_path_defaults_to_stdin() {
        assert_eq!(input_path(None), PathBuf::from("-"));
        assert_eq!(input_path(Some("a.webm".into())), PathBuf::from("a.webm"));
    }
}
