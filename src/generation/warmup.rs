//! Startup probing of backends.
//!
//! Probes are advisory: whatever happens, every backend handed in is handed back.

use crate::backend::Backend;
use crate::generation::bounded::call_bounded;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmUpConfig {
    pub probe_prompt: String,
    /// Timeout of the single probe call per backend
    pub probe_timeout: Duration,
    /// Backends not reached before this much time has passed are skipped
    pub global_deadline: Duration,
}

impl Default for WarmUpConfig {
    fn default() -> Self {
        Self {
            probe_prompt: "test".to_string(),
            probe_timeout: Duration::from_secs(2),
            global_deadline: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ProbeStatus {
    Ready,
    Degraded(String),
    NotProbed,
}

impl ProbeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeStatus::Ready => "ready",
            ProbeStatus::Degraded(_) => "degraded",
            ProbeStatus::NotProbed => "not probed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub backend_identifier: String,
    pub backend_name: String,
    pub status: ProbeStatus,
    pub elapsed_secs: Option<f64>,
}

/// Per-backend probe results plus the backends to use afterwards.
#[derive(Debug, Clone)]
pub struct WarmUpReport {
    pub results: Vec<ProbeResult>,
    pub elapsed: Duration,
    pub backends: Vec<Backend>,
}

impl WarmUpReport {
    pub fn count(&self, label: &str) -> usize {
        self.results.iter().filter(|r| r.status.label() == label).count()
    }

    pub fn status_of(&self, identifier: &str) -> Option<&ProbeStatus> {
        self.results
            .iter()
            .find(|r| r.backend_identifier == identifier)
            .map(|r| &r.status)
    }
}

pub struct WarmUpProber {
    config: WarmUpConfig,
}

impl WarmUpProber {
    pub fn new(config: WarmUpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WarmUpConfig {
        &self.config
    }

    /// Probe each backend once, in order, until the global deadline passes.
    pub async fn warm_up(&self, backends: &[Backend]) -> WarmUpReport {
        let started = Instant::now();
        let mut results = Vec::with_capacity(backends.len());

        for backend in backends {
            if started.elapsed() > self.config.global_deadline {
                info!(backend = %backend.display_name, "Warm-up deadline passed, skipping probe");
                results.push(ProbeResult {
                    backend_identifier: backend.identifier.clone(),
                    backend_name: backend.display_name.clone(),
                    status: ProbeStatus::NotProbed,
                    elapsed_secs: None,
                });
                continue;
            }

            let probe_started = Instant::now();
            let status = match call_bounded(
                backend.handle.clone(),
                self.config.probe_prompt.clone(),
                self.config.probe_timeout,
            )
            .await
            {
                Ok(_) => {
                    info!(backend = %backend.display_name, "Backend ready");
                    ProbeStatus::Ready
                }
                Err(failure) => {
                    warn!(
                        backend = %backend.display_name,
                        error = %failure,
                        "Backend probe failed, keeping it anyway"
                    );
                    ProbeStatus::Degraded(failure.to_string())
                }
            };
            results.push(ProbeResult {
                backend_identifier: backend.identifier.clone(),
                backend_name: backend.display_name.clone(),
                status,
                elapsed_secs: Some(probe_started.elapsed().as_secs_f64()),
            });
        }

        let report = WarmUpReport {
            results,
            elapsed: started.elapsed(),
            backends: backends.to_vec(),
        };
        info!(
            ready = report.count("ready"),
            degraded = report.count("degraded"),
            not_probed = report.count("not probed"),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Warm-up finished"
        );
        report
    }
}
