//! # Notification Dispatch
//!
//! The workflow commits first; notification happens after, through the
//! [`Notifier`] seam. A failed delivery never rolls back committed state
//! — it is logged and surfaced as a degraded-but-successful result.
//! Actual transport (SMS, EDI, email) lives behind this trait in a
//! separate delivery component; this crate ships a logging
//! implementation and a recording one for tests and embedders.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use tms_workflow::WorkflowEvent;

/// Notification delivery failure. Carries operator-facing context only;
/// the workflow result is already committed when this is raised.
#[derive(Error, Debug, Clone)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Post-commit notification seam.
///
/// Implementations must not block for long — the coordinator invokes
/// this on the request path after commit, and slow transports belong
/// behind their own queue.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Deliver one committed workflow event.
    fn notify(&self, event: &WorkflowEvent) -> Result<(), NotifyError>;
}

/// Notifier that writes events to the structured log. The default.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &WorkflowEvent) -> Result<(), NotifyError> {
        tracing::info!(
            event_type = event.event_type(),
            offer_id = ?event.offer_id(),
            "workflow event"
        );
        Ok(())
    }
}

/// Notifier that records events in memory. Used by tests to assert on
/// emitted events, and useful for embedders draining events themselves.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the recorded events.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &WorkflowEvent) -> Result<(), NotifyError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Notifier that always fails. Exercises the degraded-result path.
#[derive(Debug, Clone, Copy)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _event: &WorkflowEvent) -> Result<(), NotifyError> {
        Err(NotifyError("transport unreachable".to_string()))
    }
}

/// Deliver an event through the notifier, converting failure into a
/// response warning. The commit already happened; this can only degrade
/// the result, never fail it.
pub fn dispatch(notifier: &Arc<dyn Notifier>, event: &WorkflowEvent) -> Option<String> {
    match notifier.notify(event) {
        Ok(()) => None,
        Err(err) => {
            tracing::warn!(
                event_type = event.event_type(),
                error = %err,
                "notification delivery failed after commit"
            );
            Some(format!("{} notification not delivered: {err}", event.event_type()))
        }
    }
}
