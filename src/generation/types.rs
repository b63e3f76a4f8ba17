//! Generation data model: work units, outcomes and batches.

use crate::backend::Backend;
use crate::error::AttemptFailure;
use crate::progress::UnitId;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Second-resolution stamp shared by every artifact of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchTimestamp(String);

impl BatchTimestamp {
    pub const FORMAT: &'static str = "%Y%m%d_%H%M%S";

    pub fn now() -> Self {
        Self(chrono::Local::now().format(Self::FORMAT).to_string())
    }

    /// Use a caller-supplied stamp. Must be usable inside a file name.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One prompt paired with one backend, plus where its artifact will land.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub id: UnitId,
    pub prompt: String,
    pub backend: Backend,
    pub artifact_path: PathBuf,
}

/// A successfully generated and persisted image
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedArtifact {
    pub unit_id: UnitId,
    pub artifact_path: PathBuf,
    pub backend_identifier: String,
    pub backend_name: String,
    pub prompt: String,
    /// Time from the unit's first attempt until the artifact was written
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub attempt_count: usize,
}

/// A unit that used up its retry budget
#[derive(Debug, Clone, Serialize)]
pub struct ExhaustedUnit {
    pub unit_id: UnitId,
    pub backend_identifier: String,
    pub backend_name: String,
    pub prompt: String,
    pub attempt_count: usize,
    #[serde(serialize_with = "serialize_display")]
    pub last_reason: AttemptFailure,
}

/// Terminal result of a work unit
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success(GeneratedArtifact),
    Exhausted(ExhaustedUnit),
}

impl Outcome {
    pub fn unit_id(&self) -> &UnitId {
        match self {
            Outcome::Success(artifact) => &artifact.unit_id,
            Outcome::Exhausted(unit) => &unit.unit_id,
        }
    }

    pub fn backend_identifier(&self) -> &str {
        match self {
            Outcome::Success(artifact) => &artifact.backend_identifier,
            Outcome::Exhausted(unit) => &unit.backend_identifier,
        }
    }

    pub fn backend_name(&self) -> &str {
        match self {
            Outcome::Success(artifact) => &artifact.backend_name,
            Outcome::Exhausted(unit) => &unit.backend_name,
        }
    }

    pub fn attempt_count(&self) -> usize {
        match self {
            Outcome::Success(artifact) => artifact.attempt_count,
            Outcome::Exhausted(unit) => unit.attempt_count,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        match self {
            Outcome::Success(artifact) => Some(artifact),
            Outcome::Exhausted(_) => None,
        }
    }
}

/// All outcomes of one dispatched batch, in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationBatch {
    #[serde(serialize_with = "serialize_display")]
    pub timestamp: BatchTimestamp,
    pub outcomes: Vec<Outcome>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl GenerationBatch {
    pub fn successes(&self) -> impl Iterator<Item = &GeneratedArtifact> {
        self.outcomes.iter().filter_map(Outcome::artifact)
    }

    pub fn exhausted(&self) -> impl Iterator<Item = &ExhaustedUnit> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            Outcome::Exhausted(unit) => Some(unit),
            Outcome::Success(_) => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn exhausted_count(&self) -> usize {
        self.exhausted().count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            timestamp: self.timestamp.to_string(),
            total: self.outcomes.len(),
            successes: self.success_count(),
            exhausted: self.exhausted_count(),
            elapsed: self.elapsed,
        }
    }
}

/// Summary line for a finished batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub timestamp: String,
    pub total: usize,
    pub successes: usize,
    pub exhausted: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
