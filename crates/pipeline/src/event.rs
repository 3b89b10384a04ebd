//! Session events, the reporter, and the handle returned to callers.
//!
//! A running session streams [`SessionEvent`] values over a crossbeam
//! channel: human-readable log lines, unit progress increments, and a
//! single terminal [`SessionOutcome`]. The caller holds a
//! [`SessionHandle`] to drain events and request cancellation while the
//! session runs on its worker thread. Events are sent synchronously from
//! the pipeline's own control flow; receivers must not mutate the
//! document re-entrantly.

use crossbeam::channel::{self, Receiver, Sender};
use tracing::debug;

use crate::cancel::CancelToken;

/// Terminal outcome of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// All phases completed.
    Success,
    /// The session failed; the message is user-facing.
    Failed(String),
    /// Cooperative cancellation was observed. Distinct from failure.
    Cancelled,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The failure or cancellation reason, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failed(msg) => Some(msg),
            Self::Cancelled => Some("cancelled by user"),
        }
    }
}

/// Progress update from a running session.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// The session determined its unit count and started processing.
    Started {
        /// Total units (leaves for conversion, folders for export).
        total_units: u64,
    },
    /// A human-readable log line.
    Log(String),
    /// One or more units of progress.
    Progress { units: u64 },
    /// The session finished; no further events follow.
    Completed(SessionOutcome),
}

impl SessionEvent {
    /// Whether this event terminates the session.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Sends session events; one per session, owned by the pipeline.
///
/// Send failures are ignored: a caller that dropped its handle simply
/// stops listening, which must not fail the session.
#[derive(Clone, Debug)]
pub struct Reporter {
    tx: Sender<SessionEvent>,
}

impl Reporter {
    /// Create a reporter and the receiving end for a handle.
    pub fn channel() -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }

    pub fn started(&self, total_units: u64) {
        let _ = self.tx.send(SessionEvent::Started { total_units });
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "lb_session", "{message}");
        let _ = self.tx.send(SessionEvent::Log(message));
    }

    /// Report one unit of progress.
    pub fn progress(&self) {
        let _ = self.tx.send(SessionEvent::Progress { units: 1 });
    }

    pub fn completed(&self, outcome: SessionOutcome) {
        let _ = self.tx.send(SessionEvent::Completed(outcome));
    }
}

/// Handle for monitoring and controlling an active session.
///
/// The caller holds this to receive events and request cancellation.
/// Dropping the handle detaches from the session but does not cancel it.
#[derive(Debug)]
pub struct SessionHandle {
    events_rx: Receiver<SessionEvent>,
    cancel: CancelToken,
}

impl SessionHandle {
    pub(crate) fn new(events_rx: Receiver<SessionEvent>, cancel: CancelToken) -> Self {
        Self { events_rx, cancel }
    }

    /// Try to receive the next event (non-blocking).
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait for the next event (blocking). `None` once the session is
    /// gone and the channel is drained.
    pub fn recv_event(&self) -> Option<SessionEvent> {
        self.events_rx.recv().ok()
    }

    /// Drain all pending events.
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Request cooperative cancellation of the session.
    pub fn cancel(&self) {
        self.cancel.request();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_predicates() {
        assert!(SessionOutcome::Success.is_success());
        assert!(!SessionOutcome::Success.is_cancelled());
        assert!(SessionOutcome::Cancelled.is_cancelled());
        assert!(!SessionOutcome::Failed("x".into()).is_success());
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(SessionOutcome::Success.message(), None);
        assert_eq!(
            SessionOutcome::Failed("no folders".into()).message(),
            Some("no folders")
        );
        assert_eq!(
            SessionOutcome::Cancelled.message(),
            Some("cancelled by user")
        );
    }

    #[test]
    fn reporter_events_arrive_in_order() {
        let (reporter, rx) = Reporter::channel();
        reporter.started(3);
        reporter.log("step one");
        reporter.progress();
        reporter.completed(SessionOutcome::Success);

        let events: Vec<SessionEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], SessionEvent::Started { total_units: 3 }));
        assert!(matches!(&events[1], SessionEvent::Log(m) if m == "step one"));
        assert!(matches!(events[2], SessionEvent::Progress { units: 1 }));
        assert!(events[3].is_completed());
    }

    #[test]
    fn reporter_survives_dropped_receiver() {
        let (reporter, rx) = Reporter::channel();
        drop(rx);
        // Must not panic.
        reporter.log("nobody listening");
        reporter.completed(SessionOutcome::Success);
    }

    #[test]
    fn handle_cancel_sets_token() {
        let (_reporter, rx) = Reporter::channel();
        let token = CancelToken::new();
        let handle = SessionHandle::new(rx, token.clone());
        assert!(!handle.is_cancel_requested());
        handle.cancel();
        assert!(token.is_requested());
    }
}
