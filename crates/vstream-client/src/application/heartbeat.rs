//! Heartbeat keeper: periodic keep-alive requests for an open session.
//!
//! The keeper does not send anything itself.  Each tick posts
//! [`SessionEvent::HeartbeatTick`] to the session's event channel and the
//! session decides, in its own task, whether to send `"h"`.  A tick that was
//! already queued when the session closed therefore reaches a session in
//! `CLOSED` and is discarded there; cancelling the timer never has to be
//! instantaneous.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::session::{EventSender, SessionEvent};

/// Shortest period any session timer runs at.  `tokio::time::interval`
/// panics on a zero period, so shorter requests are raised to this.
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// Owns the timer task of one session.
#[derive(Debug)]
pub struct HeartbeatKeeper {
    task: Option<JoinHandle<()>>,
}

impl HeartbeatKeeper {
    /// Starts ticking every `period` (at least [`MIN_TIMER_PERIOD`]).  The
    /// first tick fires one full period after start.
    pub fn start(period: Duration, events: EventSender) -> Self {
        let period = period.max(MIN_TIMER_PERIOD);
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first `tick()` resolves immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if events.send(SessionEvent::HeartbeatTick).is_err() {
                    debug!("heartbeat: session event channel closed");
                    break;
                }
            }
        });

        Self { task: Some(task) }
    }

    /// Cancels the timer.  Calling it again does nothing.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("heartbeat stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for HeartbeatKeeper {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
