//! Event schema for attempt-level progress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one work unit inside a batch: which prompt, which backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId {
    pub prompt_index: usize,
    pub backend_identifier: String,
}

impl UnitId {
    pub fn new(prompt_index: usize, backend_identifier: impl Into<String>) -> Self {
        Self {
            prompt_index,
            backend_identifier: backend_identifier.into(),
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}/{}", self.prompt_index + 1, self.backend_identifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Attempting,
    Succeeded,
    TimedOut,
    Failed,
    Retrying,
    Exhausted,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Succeeded | AttemptStatus::Exhausted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub unit_id: UnitId,
    pub backend_name: String,
    /// 0-based
    pub attempt_index: usize,
    pub max_attempts: usize,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProgressEvent {
    pub fn new(
        unit_id: UnitId,
        backend_name: impl Into<String>,
        attempt_index: usize,
        max_attempts: usize,
        status: AttemptStatus,
    ) -> Self {
        Self {
            unit_id,
            backend_name: backend_name.into(),
            attempt_index,
            max_attempts,
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
