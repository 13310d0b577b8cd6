//! Transport session: one publish or watch connection.
//!
//! # State machine
//!
//! ```text
//!               Opened                      CloseRequested / Closed /
//!  CONNECTING ─────────▶ OPEN ──────────────Errored / DeviceEnded─────▶ CLOSED
//!       │                                                                  ▲
//!       └──────── HandshakeFailed / Errored / Closed / CloseRequested ─────┘
//! ```
//!
//! Every input to the session, whether it comes from the network, the
//! heartbeat timer, the capture device, or the caller, is a
//! [`SessionEvent`].  [`SessionMachine::handle`] is the single transition
//! function, and it runs on exactly one Tokio task, so events are processed
//! strictly one at a time in the order they were posted.
//!
//! # Entering CLOSED
//!
//! The transition into `CLOSED` sets the state *first* and then runs the
//! teardown actions in a fixed order:
//!
//! 1. stop the heartbeat keeper
//! 2. stop and release the capture source (publish)
//! 3. close the connection
//! 4. release the chunk sink and playback surface (watch, unless retained)
//! 5. notify observers that the session closed
//!
//! Because the state is already `CLOSED` when the actions run, any event that
//! arrives later (a heartbeat tick queued before the timer was cancelled, a
//! second close request, the connection's own close notification) matches
//! the `CLOSED` arm and is dropped.  Closing twice is therefore a no-op by
//! construction.
//!
//! # Re-entrancy
//!
//! Observers may call [`SessionController::close`] from inside a callback.
//! The call only posts [`SessionEvent::CloseRequested`] to the queue, so it
//! is handled after the current event finishes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use vstream_core::{ChunkSink, ControlMessage, Frame, Role, SessionId, SessionState};

use super::capture::{CaptureAdapter, MediaSource};
use super::heartbeat::HeartbeatKeeper;

/// Sending half of a session's event queue.
pub type EventSender = UnboundedSender<SessionEvent>;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures surfaced by a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The connection never reached OPEN.  Terminal.
    #[error("handshake failed: {0}")]
    HandshakeFailure(String),

    /// The connection failed while OPEN.  The session closes.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server reported an error on the text channel.  Advisory only.
    #[error("server error: {0}")]
    Remote(String),

    /// The capture source could not be started on OPEN.  The session closes.
    #[error("capture error: {0}")]
    Capture(String),
}

impl SessionError {
    /// `true` for failures that ended the session abnormally.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::Remote(_))
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Every input the session state machine reacts to.
pub enum SessionEvent {
    /// The handshake succeeded; the session now owns `link`.
    Opened(Box<dyn Link>),
    /// The handshake failed.
    HandshakeFailed(SessionError),
    /// A frame arrived on the connection.
    Message(Frame),
    /// The connection reported an error.
    Errored(String),
    /// The connection was closed by the remote end.
    Closed,
    /// The capture device ended (publish).
    DeviceEnded,
    /// The caller asked to close the session.
    CloseRequested,
    /// The heartbeat period elapsed.
    HeartbeatTick,
    /// The capture source produced a segment (publish).
    Segment(Bytes),
    /// The caller wants a control message sent.
    SendControl(ControlMessage),
    /// The playback surface reached this position (watch).
    PlaybackProgress(Duration),
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Opened(_) => f.write_str("Opened"),
            SessionEvent::HandshakeFailed(e) => f.debug_tuple("HandshakeFailed").field(e).finish(),
            SessionEvent::Message(Frame::Binary(data)) => write!(f, "Message(Binary, {} bytes)", data.len()),
            SessionEvent::Message(Frame::Text(text)) => f.debug_tuple("Message").field(text).finish(),
            SessionEvent::Errored(e) => f.debug_tuple("Errored").field(e).finish(),
            SessionEvent::Closed => f.write_str("Closed"),
            SessionEvent::DeviceEnded => f.write_str("DeviceEnded"),
            SessionEvent::CloseRequested => f.write_str("CloseRequested"),
            SessionEvent::HeartbeatTick => f.write_str("HeartbeatTick"),
            SessionEvent::Segment(data) => write!(f, "Segment({} bytes)", data.len()),
            SessionEvent::SendControl(msg) => f.debug_tuple("SendControl").field(msg).finish(),
            SessionEvent::PlaybackProgress(pos) => f.debug_tuple("PlaybackProgress").field(pos).finish(),
        }
    }
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// The writable side of an established connection.
///
/// Inbound traffic is not read through this trait: the connector posts it to
/// the session's event queue as [`SessionEvent::Message`],
/// [`SessionEvent::Errored`], and [`SessionEvent::Closed`].
pub trait Link: Send {
    /// Queues one frame for sending.  Frames are delivered in call order.
    fn send(&mut self, frame: Frame) -> Result<(), SessionError>;

    /// Starts a graceful close.  Idempotent.
    fn close(&mut self);
}

/// Establishes connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Performs the handshake with `url`.
    ///
    /// On success the returned link is open and inbound traffic will be
    /// posted to `events`.  Dropping the returned future cancels the
    /// handshake.
    async fn connect(&self, url: &str, events: EventSender) -> Result<Box<dyn Link>, SessionError>;
}

/// Receives session notifications.  All methods default to doing nothing.
#[cfg_attr(test, mockall::automock)]
pub trait SessionObserver: Send {
    fn on_opened(&mut self, _id: &SessionId) {}
    fn on_error(&mut self, _id: &SessionId, _error: &SessionError) {}
    fn on_closed(&mut self, _id: &SessionId) {}
}

/// What the playback surface receives after every appended chunk.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackUpdate<'a> {
    /// Everything received so far, in arrival order.
    pub buffer: &'a [u8],
    /// The segment that was just appended.
    pub chunk: &'a [u8],
    /// Number of segments appended.
    pub chunk_count: usize,
    /// Where a restarted surface should resume playback.
    pub resume_at: Duration,
}

/// Presents reassembled media to the user (watch).
pub trait PlaybackSurface: Send {
    fn present(&mut self, update: PlaybackUpdate<'_>);

    /// Frees whatever the surface holds.  Called once when the session
    /// closes without retaining its buffer.
    fn release(&mut self) {}
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Timing and retention settings of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Keep-alive period.  Values below `MIN_TIMER_PERIOD` are raised to it.
    pub heartbeat_interval: Duration,
    /// Capture cadence: one segment per interval (publish).  Raised to
    /// `MIN_TIMER_PERIOD` like the heartbeat.
    pub capture_interval: Duration,
    /// Keep the reassembled buffer after close (watch).
    pub retain_watch_buffer: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(20),
            capture_interval: Duration::from_millis(500),
            retain_watch_buffer: false,
        }
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

enum RoleState {
    Publish {
        /// Acquired but not yet producing.  Present until OPEN or CLOSED.
        device: Option<Box<dyn MediaSource>>,
        /// Present only while OPEN.
        capture: Option<CaptureAdapter>,
    },
    Watch {
        sink: ChunkSink,
        surface: Box<dyn PlaybackSurface>,
        resume_at: Duration,
    },
}

/// The transition function of a session together with everything it owns.
pub struct SessionMachine {
    id: SessionId,
    config: SessionConfig,
    state: SessionState,
    events: EventSender,
    link: Option<Box<dyn Link>>,
    heartbeat: Option<HeartbeatKeeper>,
    role: RoleState,
    observers: Vec<Box<dyn SessionObserver>>,
    failure: Option<SessionError>,
}

impl SessionMachine {
    fn new(
        id: SessionId,
        config: SessionConfig,
        role: RoleState,
        observers: Vec<Box<dyn SessionObserver>>,
        events: EventSender,
    ) -> Self {
        Self {
            id,
            config,
            state: SessionState::Connecting,
            events,
            link: None,
            heartbeat: None,
            role,
            observers,
            failure: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_some()
    }

    pub fn capture_running(&self) -> bool {
        matches!(&self.role, RoleState::Publish { capture: Some(_), .. })
    }

    /// Applies one event.
    pub fn handle(&mut self, event: SessionEvent) {
        match (self.state, event) {
            (SessionState::Closed, SessionEvent::Opened(mut link)) => link.close(),
            (SessionState::Closed, event) => debug!(session = %self.id, "ignoring {event:?} after close"),

            (_, SessionEvent::CloseRequested) => {
                info!(session = %self.id, "close requested");
                self.enter_closed();
            }
            (_, SessionEvent::PlaybackProgress(position)) => self.record_position(position),

            (SessionState::Connecting, SessionEvent::Opened(link)) => self.enter_open(link),
            (SessionState::Connecting, SessionEvent::HandshakeFailed(error)) => self.fail(error),
            (SessionState::Connecting, SessionEvent::Errored(reason)) => {
                self.fail(SessionError::HandshakeFailure(reason))
            }
            (SessionState::Connecting, SessionEvent::Closed) => self.fail(SessionError::HandshakeFailure(
                "connection closed before the session opened".to_string(),
            )),

            (SessionState::Open, SessionEvent::Message(Frame::Binary(data))) => self.on_binary(data),
            (SessionState::Open, SessionEvent::Message(Frame::Text(text))) => self.on_text(&text),
            (SessionState::Open, SessionEvent::Errored(reason)) => self.fail(SessionError::Transport(reason)),
            (SessionState::Open, SessionEvent::Closed) => {
                info!(session = %self.id, "connection closed by server");
                self.enter_closed();
            }
            (SessionState::Open, SessionEvent::DeviceEnded) => {
                info!(session = %self.id, "capture device ended; closing");
                self.enter_closed();
            }
            (SessionState::Open, SessionEvent::HeartbeatTick) => {
                self.send(Frame::control(&ControlMessage::Heartbeat));
            }
            (SessionState::Open, SessionEvent::Segment(data)) => {
                if !data.is_empty() {
                    self.send(Frame::Binary(data));
                }
            }
            (SessionState::Open, SessionEvent::SendControl(message)) => {
                self.send(Frame::control(&message));
            }

            (state, SessionEvent::Opened(mut link)) => {
                warn!(session = %self.id, "unexpected second handshake in {state}");
                link.close();
            }
            (state, event) => debug!(session = %self.id, "ignoring {event:?} in {state}"),
        }
    }

    fn enter_open(&mut self, link: Box<dyn Link>) {
        self.state = SessionState::Open;
        self.link = Some(link);
        info!(session = %self.id, "session open");

        self.heartbeat = Some(HeartbeatKeeper::start(
            self.config.heartbeat_interval,
            self.events.clone(),
        ));

        if let RoleState::Publish { device, capture } = &mut self.role {
            if let Some(source) = device.take() {
                match CaptureAdapter::start(source, self.config.capture_interval, self.events.clone()) {
                    Ok(adapter) => *capture = Some(adapter),
                    Err(e) => {
                        self.fail(SessionError::Capture(e.to_string()));
                        return;
                    }
                }
            }
        }

        let id = &self.id;
        self.observers.iter_mut().for_each(|o| o.on_opened(id));
    }

    fn on_binary(&mut self, data: Bytes) {
        let RoleState::Watch { sink, surface, resume_at } = &mut self.role else {
            debug!(session = %self.id, "ignoring {} inbound bytes on a publish session", data.len());
            return;
        };

        sink.append(&data);
        debug!(session = %self.id, chunks = sink.chunk_count(), bytes = sink.len(), "segment appended");
        surface.present(PlaybackUpdate {
            buffer: sink.buffer(),
            chunk: &data,
            chunk_count: sink.chunk_count(),
            resume_at: *resume_at,
        });
    }

    fn on_text(&mut self, text: &str) {
        match ControlMessage::decode(text) {
            Some(ControlMessage::Heartbeat) => debug!(session = %self.id, "heartbeat acknowledged"),
            Some(ControlMessage::Error(message)) => {
                warn!(session = %self.id, "server reported: {message}");
                self.notify_error(&SessionError::Remote(message));
            }
            None => debug!(session = %self.id, "ignoring unrecognised text frame"),
        }
    }

    fn record_position(&mut self, position: Duration) {
        if let RoleState::Watch { resume_at, .. } = &mut self.role {
            // A restarted surface reports zero before it has resumed.
            if !position.is_zero() {
                *resume_at = position;
            }
        }
    }

    fn send(&mut self, frame: Frame) {
        let Some(link) = self.link.as_mut() else {
            return;
        };
        if let Err(e) = link.send(frame) {
            self.fail(e);
        }
    }

    fn notify_error(&mut self, error: &SessionError) {
        let id = &self.id;
        self.observers.iter_mut().for_each(|o| o.on_error(id, error));
    }

    /// Surfaces a fatal error and closes.
    fn fail(&mut self, error: SessionError) {
        if self.is_closed() {
            return;
        }
        warn!(session = %self.id, "{error}");
        self.notify_error(&error);
        self.failure = Some(error);
        self.enter_closed();
    }

    fn enter_closed(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = SessionState::Closed;

        if let Some(mut heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
        }

        match &mut self.role {
            RoleState::Publish { device, capture } => {
                if let Some(mut adapter) = capture.take() {
                    adapter.stop();
                } else if let Some(mut source) = device.take() {
                    source.stop();
                }
            }
            RoleState::Watch { .. } => {}
        }

        if let Some(mut link) = self.link.take() {
            link.close();
        }

        if let RoleState::Watch { sink, surface, .. } = &mut self.role {
            if !self.config.retain_watch_buffer {
                sink.release();
                surface.release();
            }
        }

        info!(session = %self.id, "session closed");
        let id = &self.id;
        self.observers.iter_mut().for_each(|o| o.on_closed(id));
    }

    fn into_report(self) -> SessionReport {
        let retained_buffer = match self.role {
            RoleState::Watch { sink, .. } if self.config.retain_watch_buffer => Some(sink.into_bytes()),
            _ => None,
        };
        SessionReport {
            id: self.id,
            failure: self.failure,
            retained_buffer,
        }
    }
}

// ── Session builder ───────────────────────────────────────────────────────────

/// A session in CONNECTING that has not been started yet.
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    role: RoleState,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl Session {
    /// Creates a publish session that will send segments from `source`.
    ///
    /// The session takes exclusive ownership of the source; no other session
    /// can attach to the same device.
    pub fn publish(
        channel: impl Into<String>,
        key: impl Into<String>,
        config: SessionConfig,
        source: Box<dyn MediaSource>,
    ) -> Self {
        Self {
            id: SessionId::new(channel, key, Role::Publish),
            config,
            role: RoleState::Publish {
                device: Some(source),
                capture: None,
            },
            observers: Vec::new(),
        }
    }

    /// Creates a watch session that presents received media on `surface`.
    pub fn watch(
        channel: impl Into<String>,
        key: impl Into<String>,
        config: SessionConfig,
        surface: Box<dyn PlaybackSurface>,
    ) -> Self {
        Self {
            id: SessionId::new(channel, key, Role::Watch),
            config,
            role: RoleState::Watch {
                sink: ChunkSink::new(),
                surface,
                resume_at: Duration::ZERO,
            },
            observers: Vec::new(),
        }
    }

    /// Registers an observer.  Observers are notified in registration order.
    pub fn with_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Starts the handshake with `url` and returns immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(self, connector: Arc<dyn Connector>, url: impl Into<String>) -> SessionHandle {
        let url = url.into();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let machine = SessionMachine::new(
            self.id,
            self.config,
            self.role,
            self.observers,
            events_tx.clone(),
        );

        let span = tracing::info_span!("session", instance = %Uuid::new_v4());
        let task = tokio::spawn(drive(machine, connector, url, events_rx).instrument(span));

        SessionHandle {
            controller: SessionController { events: events_tx },
            task,
        }
    }
}

/// Runs a session until it is CLOSED.
async fn drive(
    mut machine: SessionMachine,
    connector: Arc<dyn Connector>,
    url: String,
    mut events: UnboundedReceiver<SessionEvent>,
) -> SessionReport {
    info!(session = %machine.id, "connecting");

    {
        let connect = connector.connect(&url, machine.events.clone());
        tokio::pin!(connect);

        while machine.state() == SessionState::Connecting {
            tokio::select! {
                result = &mut connect => match result {
                    Ok(link) => machine.handle(SessionEvent::Opened(link)),
                    Err(e) => machine.handle(SessionEvent::HandshakeFailed(e)),
                },
                Some(event) = events.recv() => machine.handle(event),
            }
        }
        // Leaving this block drops a still-pending handshake.
    }

    while !machine.is_closed() {
        match events.recv().await {
            Some(event) => machine.handle(event),
            None => break,
        }
    }

    machine.into_report()
}

// ── Handles ───────────────────────────────────────────────────────────────────

/// How a session ended.
#[derive(Debug)]
pub struct SessionReport {
    pub id: SessionId,
    /// The error that closed the session, if it did not close cleanly.
    pub failure: Option<SessionError>,
    /// The reassembled watch buffer, when retention was configured.
    pub retained_buffer: Option<Bytes>,
}

/// Cloneable, non-blocking control surface of a running session.
///
/// Every method only queues an event, so all of them are safe to call from
/// inside an observer callback.
#[derive(Debug, Clone)]
pub struct SessionController {
    events: EventSender,
}

impl SessionController {
    /// Closes the session.  Idempotent; safe from any state.
    pub fn close(&self) {
        let _ = self.events.send(SessionEvent::CloseRequested);
    }

    /// Sends a control message if the session is OPEN; dropped otherwise.
    pub fn send_control(&self, message: ControlMessage) {
        let _ = self.events.send(SessionEvent::SendControl(message));
    }

    /// Records the playback position to resume from (watch).
    pub fn report_playback_position(&self, position: Duration) {
        let _ = self.events.send(SessionEvent::PlaybackProgress(position));
    }
}

/// Owner handle of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    controller: SessionController,
    task: JoinHandle<SessionReport>,
}

impl SessionHandle {
    pub fn controller(&self) -> SessionController {
        self.controller.clone()
    }

    pub fn close(&self) {
        self.controller.close();
    }

    pub fn send_control(&self, message: ControlMessage) {
        self.controller.send_control(message);
    }

    pub fn report_playback_position(&self, position: Duration) {
        self.controller.report_playback_position(position);
    }

    /// `true` once the session has reached CLOSED and its task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the session to close.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the session task panicked or
    /// was cancelled.
    pub async fn closed(self) -> Result<SessionReport, SessionError> {
        self.task
            .await
            .map_err(|e| SessionError::Transport(format!("session task failed: {e}")))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
