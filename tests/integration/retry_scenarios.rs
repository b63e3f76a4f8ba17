use promptcast::error::{BackendError, BackendErrorKind};
use promptcast::generation::{Outcome, RetryPolicy, RetryingGenerator, WorkUnit};
use promptcast::progress::{AttemptStatus, NoopProgress, RecordingProgress, UnitId};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::test_utils::{backend, png, FakeBackend, Step};

fn unit(dir: &TempDir, fake: Arc<FakeBackend>) -> WorkUnit {
    WorkUnit {
        id: UnitId::new(0, "1"),
        prompt: "geometric tiles".to_string(),
        backend: backend("1", "Flux", fake),
        artifact_path: dir.path().join("flux_1_20240315_101500.png"),
    }
}

#[tokio::test(start_paused = true)]
async fn five_timeouts_then_success_counts_six_attempts() {
    let dir = TempDir::new().unwrap();
    let fake = FakeBackend::new(vec![
        Step::Hang,
        Step::Hang,
        Step::Hang,
        Step::Hang,
        Step::Hang,
        Step::Succeed(png()),
    ]);
    let policy = RetryPolicy::default();
    let generator = RetryingGenerator::new(policy.clone(), Arc::new(NoopProgress));

    let outcome = generator.generate(&unit(&dir, fake.clone())).await;

    let artifact = outcome.artifact().expect("sixth attempt succeeds");
    assert_eq!(artifact.attempt_count, 6);
    assert!(artifact.elapsed >= policy.retry_delay * 5);
    assert!(artifact.elapsed >= policy.per_attempt_timeout * 5);
    assert!(artifact.artifact_path.exists());
    assert_eq!(fake.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn always_timing_out_backend_is_exhausted_without_a_file() {
    let dir = TempDir::new().unwrap();
    let fake = FakeBackend::always(Step::Hang);
    let progress = Arc::new(RecordingProgress::new());
    let generator = RetryingGenerator::new(RetryPolicy::default(), progress.clone());

    let outcome = generator.generate(&unit(&dir, fake)).await;

    match outcome {
        Outcome::Exhausted(unit) => {
            assert_eq!(unit.attempt_count, 6);
            assert!(unit.last_reason.is_timeout());
        }
        Outcome::Success(_) => panic!("an always-hanging backend cannot succeed"),
    }
    assert!(outcome_has_no_artifact(&dir));
    let statuses = progress.statuses_for("1");
    assert_eq!(
        statuses.iter().filter(|s| **s == AttemptStatus::TimedOut).count(),
        6
    );
    assert_eq!(statuses.last(), Some(&AttemptStatus::Exhausted));
}

#[tokio::test(start_paused = true)]
async fn fail_fast_gives_up_on_missing_model() {
    let dir = TempDir::new().unwrap();
    let fake = FakeBackend::always(Step::Fail(BackendError::new(
        BackendErrorKind::ModelNotFound,
        "no such model",
    )));
    let policy = RetryPolicy {
        fail_fast: true,
        ..RetryPolicy::default()
    };
    let generator = RetryingGenerator::new(policy, Arc::new(NoopProgress));

    let outcome = generator.generate(&unit(&dir, fake.clone())).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempt_count(), 1);
    assert_eq!(fake.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limits_are_retried_even_with_fail_fast() {
    let dir = TempDir::new().unwrap();
    let fake = FakeBackend::new(vec![
        Step::Fail(BackendError::new(BackendErrorKind::RateLimited, "slow down")),
        Step::Succeed(png()),
    ]);
    let policy = RetryPolicy {
        fail_fast: true,
        ..RetryPolicy::default()
    };
    let generator = RetryingGenerator::new(policy, Arc::new(NoopProgress));

    let outcome = generator.generate(&unit(&dir, fake)).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempt_count(), 2);
}

fn outcome_has_no_artifact(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}
