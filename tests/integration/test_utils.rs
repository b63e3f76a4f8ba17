//! Shared test utilities for integration tests
//!
//! Provides a scripted in-process backend and XDG environment isolation.

use async_trait::async_trait;
use promptcast::backend::{Backend, BackendRegistry, ImageBackend};
use promptcast::error::BackendError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// What one backend call does
#[derive(Debug, Clone)]
pub enum Step {
    Succeed(Vec<u8>),
    Fail(BackendError),
    Hang,
    Delay(Duration),
}

/// Backend that plays a fixed script; the last step repeats.
pub struct FakeBackend {
    steps: Vec<Step>,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new(vec![step])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageBackend for FakeBackend {
    async fn invoke(&self, _prompt: &str) -> Result<Vec<u8>, BackendError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(index)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or(Step::Hang);
        match step {
            Step::Succeed(bytes) => Ok(bytes),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
            Step::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(b"\x89PNG".to_vec())
            }
        }
    }

    fn model_name(&self) -> &str {
        "fake/model"
    }

    fn kind(&self) -> &'static str {
        "fake"
    }
}

pub fn png() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\n".to_vec()
}

pub fn backend(identifier: &str, name: &str, fake: Arc<FakeBackend>) -> Backend {
    Backend::new(identifier, name, fake)
}

pub fn registry(backends: Vec<Backend>) -> BackendRegistry {
    BackendRegistry::new(backends).unwrap()
}

pub fn prompts(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with XDG_CONFIG_HOME pointed at `test_dir`, restoring it afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().join("xdg"));

    let result = f();

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}
