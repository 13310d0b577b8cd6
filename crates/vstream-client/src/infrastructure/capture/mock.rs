//! Mock media source for tests.
//!
//! Allows tests to inject synthetic segments and a device-ended signal
//! without a real encoder.  Clones share state, so a test can keep one clone
//! after moving the other into a session and still observe `stop()` calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::application::capture::{CaptureError, MediaSource, SourceEvent};

#[derive(Default)]
struct MockState {
    sender: Option<UnboundedSender<SourceEvent>>,
    cadence: Option<Duration>,
    start_count: u32,
    stop_count: u32,
    fail_start: bool,
}

/// A [`MediaSource`] driven entirely by the test.
#[derive(Clone, Default)]
pub struct MockMediaSource {
    state: Arc<Mutex<MockState>>,
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose `start` fails.
    pub fn failing() -> Self {
        let source = Self::new();
        source.state.lock().expect("lock poisoned").fail_start = true;
        source
    }

    /// Emits one segment, as if the encoder produced it.
    ///
    /// Returns `false` if the source is not running.
    pub fn inject_segment(&self, data: impl Into<Bytes>) -> bool {
        let guard = self.state.lock().expect("lock poisoned");
        match &guard.sender {
            Some(sender) => sender.send(SourceEvent::Segment(data.into())).is_ok(),
            None => false,
        }
    }

    /// Signals that the device went away.
    pub fn end_device(&self) -> bool {
        let guard = self.state.lock().expect("lock poisoned");
        match &guard.sender {
            Some(sender) => sender.send(SourceEvent::Ended).is_ok(),
            None => false,
        }
    }

    /// Drops the output channel without signalling end, as a crashed encoder
    /// would.
    pub fn disconnect(&self) -> bool {
        self.state.lock().expect("lock poisoned").sender.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().expect("lock poisoned").sender.is_some()
    }

    /// The cadence passed to the most recent `start`.
    pub fn cadence(&self) -> Option<Duration> {
        self.state.lock().expect("lock poisoned").cadence
    }

    pub fn start_count(&self) -> u32 {
        self.state.lock().expect("lock poisoned").start_count
    }

    pub fn stop_count(&self) -> u32 {
        self.state.lock().expect("lock poisoned").stop_count
    }
}

impl MediaSource for MockMediaSource {
    fn start(&mut self, cadence: Duration) -> Result<UnboundedReceiver<SourceEvent>, CaptureError> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.start_count += 1;
        if state.fail_start {
            return Err(CaptureError::StartFailed("mock configured to fail".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.sender = Some(tx);
        state.cadence = Some(cadence);
        Ok(rx)
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.stop_count += 1;
        state.sender = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_segments_are_received() {
        // Arrange
        let mut source = MockMediaSource::new();
        let mut rx = source.start(Duration::from_millis(500)).unwrap();

        // Act
        assert!(source.inject_segment(&b"seg"[..]));
        assert!(source.end_device());

        // Assert
        assert_eq!(rx.recv().await, Some(SourceEvent::Segment(Bytes::from_static(b"seg"))));
        assert_eq!(rx.recv().await, Some(SourceEvent::Ended));
        assert_eq!(source.cadence(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_inject_before_start_reports_false() {
        let source = MockMediaSource::new();
        assert!(!source.inject_segment(vec![1u8]));
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_disconnect_closes_channel_without_end() {
        let mut source = MockMediaSource::new();
        let mut rx = source.start(Duration::from_millis(500)).unwrap();

        assert!(source.disconnect());

        assert_eq!(rx.recv().await, None);
        assert_eq!(source.stop_count(), 0);
    }

    #[test]
    fn test_clones_share_stop_count() {
        let observer = MockMediaSource::new();
        let mut owned = observer.clone();

        owned.stop();
        owned.stop();

        assert_eq!(observer.stop_count(), 2);
    }

    #[test]
    fn test_failing_source_rejects_start() {
        let mut source = MockMediaSource::failing();
        assert!(matches!(
            source.start(Duration::from_millis(1)),
            Err(CaptureError::StartFailed(_))
        ));
        assert_eq!(source.start_count(), 1);
    }
}
