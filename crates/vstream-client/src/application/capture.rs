//! Capture source adapter for the publish role.
//!
//! # How capture works (for beginners)
//!
//! A [`MediaSource`] is anything that can produce encoded media segments at
//! a fixed cadence: an encoder pipe, a file being replayed, or a mock in
//! tests.  It reports two kinds of [`SourceEvent`] on a channel:
//!
//! - `Segment(bytes)` – one encoded segment, produced once per cadence tick.
//! - `Ended` – the device went away (pipe closed, file exhausted, camera
//!   unplugged).
//!
//! Acquiring the device (opening the file, spawning the encoder) happens when
//! the source is *constructed*, before any session exists, so a missing
//! device is reported to the caller up front.  [`MediaSource::start`] only
//! begins production.
//!
//! The [`CaptureAdapter`] owns a started source and forwards its output to
//! the session as [`SessionEvent::Segment`] and [`SessionEvent::DeviceEnded`].
//! Zero-length segments are dropped here, so the session never sends an
//! empty binary frame.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::{EventSender, SessionEvent};

/// Errors raised by media sources.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened.
    #[error("failed to open capture device '{device}': {source}")]
    Open {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a source that is already producing or that has
    /// been stopped.
    #[error("capture source '{0}' cannot be started again")]
    AlreadyStarted(String),

    /// The device refused to start.
    #[error("capture source failed to start: {0}")]
    StartFailed(String),
}

/// Output of a running media source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// One encoded segment.  May be empty; empty segments are discarded.
    Segment(Bytes),
    /// The underlying device is no longer available.
    Ended,
}

/// A local producer of encoded media segments.
///
/// Implementations must make [`stop`](MediaSource::stop) idempotent and safe
/// to call whether or not the source was ever started.
#[cfg_attr(test, mockall::automock)]
pub trait MediaSource: Send {
    /// Begins producing one segment per `cadence`.
    fn start(&mut self, cadence: Duration) -> Result<UnboundedReceiver<SourceEvent>, CaptureError>;

    /// Stops production and releases the device.
    fn stop(&mut self);
}

/// A started media source wired to a session's event channel.
pub struct CaptureAdapter {
    source: Box<dyn MediaSource>,
    forwarder: Option<JoinHandle<()>>,
}

impl CaptureAdapter {
    /// Starts `source` and forwards its output to `events`.
    ///
    /// # Errors
    ///
    /// Returns the source's [`CaptureError`] if it fails to start.  The
    /// source is stopped before the error is returned.
    pub fn start(
        mut source: Box<dyn MediaSource>,
        cadence: Duration,
        events: EventSender,
    ) -> Result<Self, CaptureError> {
        let mut output = match source.start(cadence) {
            Ok(output) => output,
            Err(e) => {
                source.stop();
                return Err(e);
            }
        };

        let forwarder = tokio::spawn(async move {
            loop {
                match output.recv().await {
                    Some(SourceEvent::Segment(data)) if data.is_empty() => {
                        debug!("capture: dropping zero-length segment");
                    }
                    Some(SourceEvent::Segment(data)) => {
                        if events.send(SessionEvent::Segment(data)).is_err() {
                            return;
                        }
                    }
                    Some(SourceEvent::Ended) => {
                        info!("capture device ended");
                        break;
                    }
                    // The source went away without saying so (its task
                    // panicked or dropped the sender).
                    None => {
                        warn!("capture source stopped without signalling end");
                        break;
                    }
                }
            }
            let _ = events.send(SessionEvent::DeviceEnded);
        });

        Ok(Self {
            source,
            forwarder: Some(forwarder),
        })
    }

    /// Stops forwarding and releases the source.  Calling it again does
    /// nothing.
    pub fn stop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
            self.source.stop();
            debug!("capture stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.forwarder.is_some()
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
