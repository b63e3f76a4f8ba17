//! Publishing of generated artifacts to downstream sinks.
//!
//! The generation core hands finished batches over here. Sinks are passed in
//! explicitly through a [`Publisher`]; there is no process-wide handle.

use crate::error::{ApiError, StorageError};
use crate::generation::{GeneratedArtifact, Outcome};
use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What a downstream collaborator receives for each successful unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactRecord {
    pub artifact_path: PathBuf,
    pub backend_identifier: String,
    pub backend_name: String,
    pub prompt: String,
    pub elapsed_secs: f64,
}

impl ArtifactRecord {
    pub fn new(
        artifact_path: impl Into<PathBuf>,
        backend_identifier: impl Into<String>,
        backend_name: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            backend_identifier: backend_identifier.into(),
            backend_name: backend_name.into(),
            prompt: prompt.into(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// File stem of the artifact, used as its product name.
    pub fn product_name(&self) -> String {
        self.artifact_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl From<&GeneratedArtifact> for ArtifactRecord {
    fn from(artifact: &GeneratedArtifact) -> Self {
        Self::new(
            artifact.artifact_path.clone(),
            artifact.backend_identifier.clone(),
            artifact.backend_name.clone(),
            artifact.prompt.clone(),
            artifact.elapsed,
        )
    }
}

/// Downstream consumer of artifact records (upload, catalog, ...).
pub trait ArtifactSink: Send + Sync {
    fn name(&self) -> &str;

    /// Accept one record. May return a link to where the artifact now lives.
    fn accept(&self, record: &ArtifactRecord) -> Result<Option<String>, ApiError>;
}

/// One catalog line
#[derive(Debug, Clone, Serialize)]
struct CatalogEntry<'a> {
    product_name: String,
    category: &'a str,
    prompt: &'a str,
    folder_path: String,
    link: Option<&'a str>,
    created_date: String,
}

/// Appends one JSON object per artifact to a catalog file.
pub struct CatalogSink {
    path: PathBuf,
    category: String,
    write_lock: Mutex<()>,
}

impl CatalogSink {
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    pub fn new(path: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category: category.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, line: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl ArtifactSink for CatalogSink {
    fn name(&self) -> &str {
        "catalog"
    }

    fn accept(&self, record: &ArtifactRecord) -> Result<Option<String>, ApiError> {
        let folder_path = record
            .artifact_path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let entry = CatalogEntry {
            product_name: record.product_name(),
            category: &self.category,
            prompt: &record.prompt,
            folder_path,
            link: None,
            created_date: Local::now().format(Self::DATE_FORMAT).to_string(),
        };
        let line = serde_json::to_string(&entry).map_err(|e| {
            ApiError::PublishFailed(format!("Failed to encode catalog entry: {}", e))
        })?;
        self.append_line(&line)?;
        Ok(None)
    }
}

/// Result of handing one record to one sink
#[derive(Debug, Clone, Serialize)]
pub struct SinkDelivery {
    pub sink: String,
    pub artifact_path: PathBuf,
    pub link: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
    pub deliveries: Vec<SinkDelivery>,
}

impl PublishReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.iter().filter(|d| d.error.is_some()).count()
    }
}

/// Fans successful outcomes out to every configured sink.
#[derive(Clone, Default)]
pub struct Publisher {
    sinks: Vec<Arc<dyn ArtifactSink>>,
}

impl Publisher {
    pub fn new(sinks: Vec<Arc<dyn ArtifactSink>>) -> Self {
        Self { sinks }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Best effort: a failing sink is recorded and the rest still run.
    pub fn publish(&self, outcomes: &[Outcome]) -> PublishReport {
        let mut report = PublishReport::default();
        for artifact in outcomes.iter().filter_map(Outcome::artifact) {
            let record = ArtifactRecord::from(artifact);
            for sink in &self.sinks {
                let delivery = match sink.accept(&record) {
                    Ok(link) => {
                        info!(
                            sink = sink.name(),
                            path = %record.artifact_path.display(),
                            "Artifact published"
                        );
                        SinkDelivery {
                            sink: sink.name().to_string(),
                            artifact_path: record.artifact_path.clone(),
                            link,
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(
                            sink = sink.name(),
                            path = %record.artifact_path.display(),
                            error = %e,
                            "Publishing failed"
                        );
                        SinkDelivery {
                            sink: sink.name().to_string(),
                            artifact_path: record.artifact_path.clone(),
                            link: None,
                            error: Some(e.to_string()),
                        }
                    }
                };
                report.deliveries.push(delivery);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttemptFailure;
    use crate::generation::ExhaustedUnit;
    use crate::progress::UnitId;
    use tempfile::TempDir;

    fn success(path: &str) -> Outcome {
        Outcome::Success(GeneratedArtifact {
            unit_id: UnitId::new(0, "1"),
            artifact_path: PathBuf::from(path),
            backend_identifier: "1".to_string(),
            backend_name: "Flux".to_string(),
            prompt: "tiled roses".to_string(),
            elapsed: Duration::from_secs(2),
            attempt_count: 1,
        })
    }

    fn exhausted() -> Outcome {
        Outcome::Exhausted(ExhaustedUnit {
            unit_id: UnitId::new(0, "2"),
            backend_identifier: "2".to_string(),
            backend_name: "Nercy".to_string(),
            prompt: "tiled roses".to_string(),
            attempt_count: 6,
            last_reason: AttemptFailure::TimedOut {
                after: Duration::from_secs(60),
            },
        })
    }

    struct FailingSink;

    impl ArtifactSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn accept(&self, _record: &ArtifactRecord) -> Result<Option<String>, ApiError> {
            Err(ApiError::PublishFailed("upload refused".to_string()))
        }
    }

    #[test]
    fn catalog_sink_appends_one_line_per_artifact() {
        let dir = TempDir::new().unwrap();
        let catalog = dir.path().join("catalog").join("products.jsonl");
        let sink = CatalogSink::new(&catalog, "Seamless Pattern");

        for path in ["out/flux_1_20240101_120000.png", "out/flux_1_20240101_120001.png"] {
            let outcome = success(path);
            sink.accept(&ArtifactRecord::from(outcome.artifact().unwrap())).unwrap();
        }

        let contents = std::fs::read_to_string(&catalog).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["product_name"], "flux_1_20240101_120000");
        assert_eq!(lines[0]["category"], "Seamless Pattern");
        assert_eq!(lines[0]["prompt"], "tiled roses");
        assert_eq!(lines[0]["folder_path"], "out");
        assert!(lines[0]["link"].is_null());
        assert_eq!(lines[0]["created_date"].as_str().unwrap().len(), 19);
    }

    #[test]
    fn publisher_skips_exhausted_and_survives_failing_sinks() {
        let dir = TempDir::new().unwrap();
        let catalog = dir.path().join("catalog.jsonl");
        let publisher = Publisher::default()
            .with_sink(Arc::new(FailingSink))
            .with_sink(Arc::new(CatalogSink::new(&catalog, "Seamless Pattern")));

        let report = publisher.publish(&[success("out/a.png"), exhausted(), success("out/b.png")]);

        assert_eq!(report.deliveries.len(), 4);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.delivered(), 2);
        assert_eq!(std::fs::read_to_string(&catalog).unwrap().lines().count(), 2);
    }

    #[test]
    fn record_product_name_is_file_stem() {
        let record = ArtifactRecord::new(
            "out/seamless_3_20240101_120000_p2.png",
            "3",
            "Seamless",
            "p",
            Duration::ZERO,
        );
        assert_eq!(record.product_name(), "seamless_3_20240101_120000_p2");
    }
}
