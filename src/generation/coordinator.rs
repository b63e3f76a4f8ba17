//! Fan-out coordinator: runs every (prompt, backend) unit of a batch concurrently
//! and gathers their outcomes as they complete.

use crate::backend::Backend;
use crate::error::{ApiError, AttemptFailure};
use crate::generation::bounded::join_error_message;
use crate::generation::naming::artifact_path;
use crate::generation::retry::{RetryPolicy, RetryingGenerator};
use crate::generation::types::{BatchTimestamp, ExhaustedUnit, GenerationBatch, Outcome, WorkUnit};
use crate::progress::{NoopProgress, ProgressSink, UnitId};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{error, info};

/// Dispatches batches of work units and aggregates partial results.
pub struct FanOutCoordinator {
    policy: RetryPolicy,
    output_dir: PathBuf,
    progress: Arc<dyn ProgressSink>,
    max_concurrency: Option<usize>,
}

impl FanOutCoordinator {
    pub fn new(policy: RetryPolicy, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            output_dir: output_dir.into(),
            progress: Arc::new(NoopProgress),
            max_concurrency: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Bound how many units run at once. `None` runs every unit immediately.
    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build the `prompts × backends` unit set, prompt-major.
    ///
    /// Rejects a plan that would overwrite a file already on disk, such as an
    /// earlier batch that started within the same second.
    pub fn plan_units(
        &self,
        prompts: &[String],
        backends: &[Backend],
        timestamp: &BatchTimestamp,
    ) -> Result<Vec<WorkUnit>, ApiError> {
        if backends.is_empty() {
            return Err(ApiError::EmptyBackendSet);
        }
        if prompts.is_empty() {
            return Err(ApiError::InvalidRequest("No prompts given".to_string()));
        }
        if let Some(index) = prompts.iter().position(|p| p.trim().is_empty()) {
            return Err(ApiError::InvalidRequest(format!(
                "Prompt {} is empty",
                index + 1
            )));
        }

        let mut units = Vec::with_capacity(prompts.len() * backends.len());
        let mut paths = HashSet::new();
        for (prompt_index, prompt) in prompts.iter().enumerate() {
            for backend in backends {
                let path = artifact_path(
                    &self.output_dir,
                    &backend.display_name,
                    &backend.identifier,
                    timestamp,
                    prompt_index,
                    prompts.len(),
                );
                if !paths.insert(path.clone()) {
                    return Err(ApiError::InvalidRequest(format!(
                        "Two work units would write {}",
                        path.display()
                    )));
                }
                if path.exists() {
                    return Err(ApiError::InvalidRequest(format!(
                        "{} already exists; wait a second and run the batch again",
                        path.display()
                    )));
                }
                units.push(WorkUnit {
                    id: UnitId::new(prompt_index, backend.identifier.clone()),
                    prompt: prompt.clone(),
                    backend: backend.clone(),
                    artifact_path: path,
                });
            }
        }
        Ok(units)
    }

    /// Run a batch stamped with the current second.
    ///
    /// Artifact paths are only unique within one batch. A second batch started
    /// in the same second is refused by [`Self::plan_units`] rather than
    /// overwriting the first one's files.
    pub async fn run_batch(
        &self,
        prompts: &[String],
        backends: &[Backend],
    ) -> Result<GenerationBatch, ApiError> {
        self.run_batch_at(prompts, backends, BatchTimestamp::now()).await
    }

    /// Run a batch under a fixed timestamp.
    ///
    /// Fails only for problems found before dispatch. Once units are running,
    /// every one of them ends up as an outcome in the returned batch.
    pub async fn run_batch_at(
        &self,
        prompts: &[String],
        backends: &[Backend],
        timestamp: BatchTimestamp,
    ) -> Result<GenerationBatch, ApiError> {
        self.policy.validate()?;
        if self.max_concurrency == Some(0) {
            return Err(ApiError::ConfigError(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        let units = self.plan_units(prompts, backends, &timestamp)?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(crate::error::StorageError::from)?;

        info!(
            batch = %timestamp,
            units = units.len(),
            prompts = prompts.len(),
            backends = backends.len(),
            "Batch started"
        );
        let started = Instant::now();
        let generator = Arc::new(RetryingGenerator::new(
            self.policy.clone(),
            Arc::clone(&self.progress),
        ));
        let semaphore = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));

        let mut in_flight = FuturesUnordered::new();
        for unit in units {
            let generator = Arc::clone(&generator);
            let semaphore = semaphore.clone();
            let task_unit = unit.clone();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                generator.generate(&task_unit).await
            });
            in_flight.push(async move { (unit, handle.await) });
        }

        let mut outcomes = Vec::with_capacity(in_flight.len());
        while let Some((unit, joined)) = in_flight.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    let reason = join_error_message(join_error);
                    error!(
                        unit = %unit.id,
                        backend = %unit.backend.display_name,
                        error = %reason,
                        "Work unit aborted"
                    );
                    Outcome::Exhausted(ExhaustedUnit {
                        unit_id: unit.id.clone(),
                        backend_identifier: unit.backend.identifier.clone(),
                        backend_name: unit.backend.display_name.clone(),
                        prompt: unit.prompt.clone(),
                        attempt_count: 0,
                        last_reason: AttemptFailure::Panicked(reason),
                    })
                }
            };
            outcomes.push(outcome);
        }

        let batch = GenerationBatch {
            timestamp,
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            batch = %batch.timestamp,
            successes = batch.success_count(),
            exhausted = batch.exhausted_count(),
            elapsed_secs = batch.elapsed.as_secs_f64(),
            "Batch finished"
        );
        Ok(batch)
    }
}
