use promptcast::error::BackendError;
use promptcast::generation::{ProbeStatus, WarmUpConfig, WarmUpProber};
use std::time::Duration;

use crate::integration::test_utils::{backend, png, FakeBackend, Step};

#[tokio::test(start_paused = true)]
async fn backends_past_the_deadline_are_kept_and_marked_not_probed() {
    let backends = vec![
        backend("1", "Flux", FakeBackend::always(Step::Hang)),
        backend("2", "Midjourney", FakeBackend::always(Step::Hang)),
        backend("3", "Seamless", FakeBackend::always(Step::Succeed(png()))),
        backend("4", "Nercy", FakeBackend::always(Step::Succeed(png()))),
    ];
    let prober = WarmUpProber::new(WarmUpConfig {
        probe_timeout: Duration::from_secs(2),
        global_deadline: Duration::from_secs(3),
        ..WarmUpConfig::default()
    });

    let report = prober.warm_up(&backends).await;

    let ids: Vec<&str> = report.backends.iter().map(|b| b.identifier.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert!(matches!(report.status_of("1"), Some(ProbeStatus::Degraded(_))));
    assert!(matches!(report.status_of("2"), Some(ProbeStatus::Degraded(_))));
    assert_eq!(report.status_of("3"), Some(&ProbeStatus::NotProbed));
    assert_eq!(report.status_of("4"), Some(&ProbeStatus::NotProbed));
    assert_eq!(report.count("not probed"), 2);
    assert!(report.elapsed < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn every_backend_is_probed_when_time_allows() {
    let flaky = FakeBackend::always(Step::Fail(BackendError::other("cold start")));
    let backends = vec![
        backend("1", "Flux", FakeBackend::always(Step::Succeed(png()))),
        backend("2", "Nercy", flaky.clone()),
    ];

    let report = WarmUpProber::new(WarmUpConfig::default()).warm_up(&backends).await;

    assert_eq!(report.count("ready"), 1);
    assert_eq!(report.count("degraded"), 1);
    assert_eq!(report.count("not probed"), 0);
    assert_eq!(flaky.calls(), 1);
    assert_eq!(report.backends.len(), 2);
}
