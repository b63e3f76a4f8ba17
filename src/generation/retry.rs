//! Retrying generator: drives one work unit from `Pending` to `Succeeded` or `Exhausted`.

use crate::error::{ApiError, AttemptFailure, BackendError};
use crate::generation::bounded::call_bounded;
use crate::generation::naming::{prompt_variant, SeedSource};
use crate::generation::types::{ExhaustedUnit, GeneratedArtifact, Outcome, WorkUnit};
use crate::progress::{AttemptStatus, ProgressEvent, ProgressSink};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Retry budget and timing for one work unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per unit, including the first
    pub max_retries: usize,
    pub per_attempt_timeout: Duration,
    /// Pause between a failed attempt and the next one
    pub retry_delay: Duration,
    /// Stop early on errors that retrying cannot fix (bad credentials, unknown model)
    pub fail_fast: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            per_attempt_timeout: Duration::from_secs(60),
            retry_delay: Duration::from_secs(3),
            fail_fast: false,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.max_retries == 0 {
            return Err(ApiError::ConfigError(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.per_attempt_timeout.is_zero() {
            return Err(ApiError::ConfigError(
                "per_attempt_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the attempts of a single unit strictly one after another.
pub struct RetryingGenerator {
    policy: RetryPolicy,
    progress: Arc<dyn ProgressSink>,
}

impl RetryingGenerator {
    pub fn new(policy: RetryPolicy, progress: Arc<dyn ProgressSink>) -> Self {
        Self { policy, progress }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn generate(&self, unit: &WorkUnit) -> Outcome {
        let started = Instant::now();
        let max_attempts = self.policy.max_retries;
        let mut seeds = SeedSource::new();
        let mut last_failure: Option<AttemptFailure> = None;
        let mut attempts_made = 0usize;

        for attempt in 0..max_attempts {
            attempts_made = attempt + 1;
            let variant = prompt_variant(&unit.prompt, seeds.next_seed());
            self.emit(unit, attempt, AttemptStatus::Attempting, None);
            debug!(
                unit = %unit.id,
                backend = %unit.backend.display_name,
                attempt = attempt + 1,
                max_attempts,
                prompt = %variant,
                "Attempt started"
            );

            let result = match call_bounded(
                Arc::clone(&unit.backend.handle),
                variant,
                self.policy.per_attempt_timeout,
            )
            .await
            {
                Ok(bytes) => persist_artifact(&unit.artifact_path, &bytes).await,
                Err(failure) => Err(failure),
            };

            match result {
                Ok(()) => {
                    let elapsed = started.elapsed();
                    self.emit(unit, attempt, AttemptStatus::Succeeded, None);
                    info!(
                        unit = %unit.id,
                        backend = %unit.backend.display_name,
                        attempt = attempt + 1,
                        path = %unit.artifact_path.display(),
                        elapsed_secs = elapsed.as_secs_f64(),
                        "Image generated"
                    );
                    return Outcome::Success(GeneratedArtifact {
                        unit_id: unit.id.clone(),
                        artifact_path: unit.artifact_path.clone(),
                        backend_identifier: unit.backend.identifier.clone(),
                        backend_name: unit.backend.display_name.clone(),
                        prompt: unit.prompt.clone(),
                        elapsed,
                        attempt_count: attempt + 1,
                    });
                }
                Err(failure) => {
                    let status = if failure.is_timeout() {
                        AttemptStatus::TimedOut
                    } else {
                        AttemptStatus::Failed
                    };
                    self.emit(unit, attempt, status, Some(failure.to_string()));

                    let give_up = self.policy.fail_fast && failure.is_fatal();
                    let attempts_remain = attempt + 1 < max_attempts;
                    if attempts_remain && !give_up {
                        warn!(
                            unit = %unit.id,
                            backend = %unit.backend.display_name,
                            attempt = attempt + 1,
                            error = %failure,
                            "Attempt failed, retrying"
                        );
                        last_failure = Some(failure);
                        self.emit(unit, attempt + 1, AttemptStatus::Retrying, None);
                        sleep(self.policy.retry_delay).await;
                        continue;
                    }
                    last_failure = Some(failure);
                    break;
                }
            }
        }

        let last_reason = last_failure.unwrap_or_else(|| {
            AttemptFailure::Backend(BackendError::other("no attempts were made"))
        });
        self.emit(
            unit,
            attempts_made.saturating_sub(1),
            AttemptStatus::Exhausted,
            Some(last_reason.to_string()),
        );
        error!(
            unit = %unit.id,
            backend = %unit.backend.display_name,
            attempts = attempts_made,
            error = %last_reason,
            "Generation failed after all attempts"
        );
        Outcome::Exhausted(ExhaustedUnit {
            unit_id: unit.id.clone(),
            backend_identifier: unit.backend.identifier.clone(),
            backend_name: unit.backend.display_name.clone(),
            prompt: unit.prompt.clone(),
            attempt_count: attempts_made,
            last_reason,
        })
    }

    fn emit(&self, unit: &WorkUnit, attempt: usize, status: AttemptStatus, detail: Option<String>) {
        let mut event = ProgressEvent::new(
            unit.id.clone(),
            unit.backend.display_name.clone(),
            attempt,
            self.policy.max_retries,
            status,
        );
        event.detail = detail;
        self.progress.emit(event);
    }
}

/// Write the image, leaving nothing behind if the write fails part way.
async fn persist_artifact(path: &Path, bytes: &[u8]) -> Result<(), AttemptFailure> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AttemptFailure::Storage(e.to_string()))?;
        }
    }
    if let Err(e) = tokio::fs::write(path, bytes).await {
        let _ = tokio::fs::remove_file(path).await;
        return Err(AttemptFailure::Storage(format!("{}: {}", path.display(), e)));
    }
    Ok(())
}
