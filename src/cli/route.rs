//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::backend::{load_token, Backend, BackendRegistry};
use crate::cli::help::{command_name, wants_warm_up};
use crate::cli::interactive::{ask_choice, ask_prompts, MenuChoice};
use crate::cli::output::{check_format, map_error};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_backends_json, format_backends_text, format_batch_json, format_batch_text,
    format_probe_json, format_probe_text, ConsoleProgress,
};
use crate::config::{ConfigLoader, PromptcastConfig};
use crate::error::ApiError;
use crate::generation::{FanOutCoordinator, GenerationBatch, WarmUpProber, WarmUpReport};
use crate::progress::{ProgressSink, TracingProgress};
use crate::publish::{CatalogSink, PublishReport, Publisher};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Runtime context for CLI execution: effective config, tokio runtime and backends.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: PromptcastConfig,
    workspace_root: PathBuf,
    runtime: Runtime,
    registry: Option<BackendRegistry>,
    warm_up: bool,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::resolve(&workspace_root, config_path.as_deref())?;
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(
        workspace_root: PathBuf,
        config: PromptcastConfig,
    ) -> Result<Self, ApiError> {
        let config = config.validated()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Runtime(format!("Failed to start async runtime: {}", e)))?;
        let warm_up = config.warm_up.enabled;
        Ok(Self {
            config,
            workspace_root,
            runtime,
            registry: None,
            warm_up,
        })
    }

    /// Override the configured output directory.
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = output_dir {
            self.config.output_dir = dir;
        }
        self
    }

    /// Enable the catalog sink, writing to `path`.
    pub fn with_catalog(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.config.catalog.enabled = true;
            self.config.catalog.path = path;
        }
        self
    }

    pub fn with_warm_up(mut self, enabled: bool) -> Self {
        self.warm_up = self.warm_up && enabled;
        self
    }

    /// Use these backends instead of building clients from config.
    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &PromptcastConfig {
        &self.config
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.output_dir)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, "Command started");
        let result = self.execute_inner(command);
        match &result {
            Ok(_) => info!(
                command = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Command completed"
            ),
            Err(e) => warn!(command = name, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Config => self.config.to_toml(),
            Commands::Backends { format } => {
                check_format(format)?;
                let backends = self.config.effective_backends();
                if format == "json" {
                    format_backends_json(&backends)
                } else {
                    Ok(format_backends_text(&backends))
                }
            }
            Commands::Probe { format } => {
                check_format(format)?;
                let registry = self.registry()?;
                let report = self.probe(registry.all());
                if format == "json" {
                    format_probe_json(&report)
                } else {
                    Ok(format_probe_text(&report))
                }
            }
            Commands::Generate {
                prompts,
                backends,
                format,
            } => self.handle_generate(command, prompts, backends, format),
            Commands::Interactive => self.handle_interactive(command),
        }
    }

    fn handle_generate(
        &self,
        command: &Commands,
        prompts: &[String],
        backend_ids: &[String],
        format: &str,
    ) -> Result<String, ApiError> {
        check_format(format)?;
        let registry = self.registry()?;
        let selected = if backend_ids.is_empty() {
            registry.all().to_vec()
        } else {
            registry.select(backend_ids)?
        };
        let selected = self.maybe_warm_up(command, selected);

        let progress: Arc<dyn ProgressSink> = if format == "json" {
            Arc::new(TracingProgress)
        } else {
            Arc::new(ConsoleProgress::new())
        };
        let batch = self
            .runtime
            .block_on(self.coordinator(progress).run_batch(prompts, &selected))?;
        let publish = self.publish(&batch);

        if batch.success_count() == 0 {
            eprintln!("{}", format_batch_text(&batch, publish.as_ref()));
            return Err(ApiError::GenerationFailed(format!(
                "No images were generated: all {} work units exhausted their retries",
                batch.outcomes.len()
            )));
        }
        if format == "json" {
            format_batch_json(&batch, publish.as_ref())
        } else {
            Ok(format_batch_text(&batch, publish.as_ref()))
        }
    }

    fn handle_interactive(&self, command: &Commands) -> Result<String, ApiError> {
        let registry = self.registry()?;
        let backends = self.maybe_warm_up(command, registry.all().to_vec());
        println!("{}", "Backends initialized and ready".green());

        let coordinator = self.coordinator(Arc::new(ConsoleProgress::new()));
        let mut batches = 0usize;
        let mut images = 0usize;
        loop {
            let selected = match ask_choice(&backends)? {
                MenuChoice::Quit => break,
                MenuChoice::Run(selected) => selected,
            };
            let prompts = ask_prompts()?;
            if prompts.is_empty() {
                println!("{}", "Prompt cannot be empty".yellow());
                continue;
            }
            let names: Vec<&str> = selected.iter().map(|b| b.display_name.as_str()).collect();
            println!("{} {}", "Using backends:".yellow(), names.join(", "));

            match self
                .runtime
                .block_on(coordinator.run_batch(&prompts, &selected))
            {
                Ok(batch) => {
                    let publish = self.publish(&batch);
                    println!("{}", format_batch_text(&batch, publish.as_ref()));
                    if batch.success_count() == 0 {
                        warn!(batch = %batch.timestamp, "Batch produced no images");
                    }
                    batches += 1;
                    images += batch.success_count();
                }
                Err(e) => println!("{}", map_error(&e).red()),
            }
        }
        Ok(format!(
            "Session finished: {} batches, {} images generated",
            batches, images
        ))
    }

    fn registry(&self) -> Result<BackendRegistry, ApiError> {
        if let Some(registry) = &self.registry {
            return Ok(registry.clone());
        }
        let token = load_token(&self.config.credentials.token_env)?;
        BackendRegistry::from_config(&self.config.effective_backends(), &token)
    }

    fn probe(&self, backends: &[Backend]) -> WarmUpReport {
        let prober = WarmUpProber::new(self.config.warm_up_config());
        self.runtime.block_on(prober.warm_up(backends))
    }

    fn maybe_warm_up(&self, command: &Commands, backends: Vec<Backend>) -> Vec<Backend> {
        if !self.warm_up || !wants_warm_up(command) {
            return backends;
        }
        let report = self.probe(&backends);
        eprintln!("{}", format_probe_text(&report));
        report.backends
    }

    fn coordinator(&self, progress: Arc<dyn ProgressSink>) -> FanOutCoordinator {
        FanOutCoordinator::new(self.config.retry_policy(), self.output_dir())
            .with_progress(progress)
            .with_max_concurrency(self.config.generation.max_concurrency)
    }

    fn publisher(&self) -> Option<Publisher> {
        if !self.config.catalog.enabled {
            return None;
        }
        let catalog = CatalogSink::new(
            self.resolve_path(&self.config.catalog.path),
            self.config.catalog.category.clone(),
        );
        Some(Publisher::default().with_sink(Arc::new(catalog)))
    }

    fn publish(&self, batch: &GenerationBatch) -> Option<PublishReport> {
        self.publisher()
            .map(|publisher| publisher.publish(&batch.outcomes))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}
