//! Progress sinks. The generation core emits; sinks decide what to do with it.

use crate::progress::event::{AttemptStatus, ProgressEvent};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Receiver of attempt-level progress events.
///
/// Called concurrently from every unit in a batch; implementations that
/// hold mutable state must serialize access themselves.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        let attempt = event.attempt_index + 1;
        let detail = event.detail.as_deref().unwrap_or("");
        match event.status {
            AttemptStatus::Attempting | AttemptStatus::Retrying => debug!(
                unit = %event.unit_id,
                backend = %event.backend_name,
                attempt,
                max_attempts = event.max_attempts,
                status = ?event.status,
                "Progress"
            ),
            AttemptStatus::Succeeded => info!(
                unit = %event.unit_id,
                backend = %event.backend_name,
                attempt,
                "Progress: succeeded"
            ),
            AttemptStatus::TimedOut | AttemptStatus::Failed | AttemptStatus::Exhausted => warn!(
                unit = %event.unit_id,
                backend = %event.backend_name,
                attempt,
                status = ?event.status,
                detail,
                "Progress"
            ),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn statuses_for(&self, backend_identifier: &str) -> Vec<AttemptStatus> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.unit_id.backend_identifier == backend_identifier)
            .map(|e| e.status)
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}
