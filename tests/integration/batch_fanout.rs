use promptcast::error::{BackendError, BackendErrorKind};
use promptcast::generation::{BatchTimestamp, FanOutCoordinator, RetryPolicy};
use promptcast::progress::{AttemptStatus, RecordingProgress};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::test_utils::{backend, png, prompts, FakeBackend, Step};

#[tokio::test(start_paused = true)]
async fn two_backends_one_prompt_yield_two_named_artifacts() {
    let dir = TempDir::new().unwrap();
    let coordinator = FanOutCoordinator::new(RetryPolicy::default(), dir.path());
    let backends = vec![
        backend("1", "Flux", FakeBackend::always(Step::Succeed(png()))),
        backend("2", "Midjourney", FakeBackend::always(Step::Succeed(png()))),
    ];

    let batch = coordinator
        .run_batch_at(
            &prompts(&["seamless floral"]),
            &backends,
            BatchTimestamp::from_raw("20240315_101500"),
        )
        .await
        .unwrap();

    assert_eq!(batch.success_count(), 2);
    let names: HashSet<String> = batch
        .successes()
        .map(|a| a.artifact_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains("flux_1_20240315_101500.png"));
    assert!(names.contains("midjourney_2_20240315_101500.png"));
    for artifact in batch.successes() {
        assert_eq!(std::fs::read(&artifact.artifact_path).unwrap(), png());
        assert_eq!(artifact.attempt_count, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn always_failing_unit_does_not_delay_siblings() {
    let dir = TempDir::new().unwrap();
    let progress = Arc::new(RecordingProgress::new());
    let coordinator = FanOutCoordinator::new(RetryPolicy::default(), dir.path())
        .with_progress(progress.clone());
    let failing = FakeBackend::always(Step::Fail(BackendError::new(
        BackendErrorKind::ModelLoading,
        "model is loading",
    )));
    let backends = vec![
        backend("1", "Flux", FakeBackend::always(Step::Succeed(png()))),
        backend("2", "Midjourney", FakeBackend::always(Step::Succeed(png()))),
        backend("3", "Seamless", failing.clone()),
        backend("4", "Nercy", FakeBackend::always(Step::Succeed(png()))),
    ];

    let batch = coordinator
        .run_batch(&prompts(&["tiles"]), &backends)
        .await
        .unwrap();

    assert_eq!(batch.success_count(), 3);
    assert_eq!(batch.exhausted_count(), 1);
    assert_eq!(failing.calls(), 6);
    // The exhausted unit reports last, after every sibling already finished.
    assert_eq!(batch.outcomes.last().unwrap().backend_identifier(), "3");
    for artifact in batch.successes() {
        assert!(artifact.elapsed < Duration::from_secs(1));
    }
    assert_eq!(
        progress.statuses_for("3").last(),
        Some(&AttemptStatus::Exhausted)
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[tokio::test(start_paused = true)]
async fn prompts_times_backends_units_all_get_outcomes() {
    let dir = TempDir::new().unwrap();
    let coordinator = FanOutCoordinator::new(RetryPolicy::default(), dir.path())
        .with_max_concurrency(Some(1));
    let backends = vec![
        backend("1", "Flux", FakeBackend::always(Step::Delay(Duration::from_secs(2)))),
        backend("2", "Flux", FakeBackend::always(Step::Delay(Duration::from_secs(1)))),
    ];

    let batch = coordinator
        .run_batch(&prompts(&["a", "b", "c"]), &backends)
        .await
        .unwrap();

    assert_eq!(batch.outcomes.len(), 6);
    assert_eq!(batch.success_count(), 6);
    let paths: HashSet<_> = batch.successes().map(|a| a.artifact_path.clone()).collect();
    assert_eq!(paths.len(), 6);
    let units: HashSet<_> = batch.outcomes.iter().map(|o| o.unit_id().clone()).collect();
    assert_eq!(units.len(), 6);
}
