//! Image Backend Abstraction
//!
//! A backend is a remote capability that turns a text prompt into image bytes.
//! Backends are registered once at startup and shared read-only by every unit
//! of work, so the registry hands out cheap clones around an `Arc` handle.

use crate::error::{ApiError, BackendError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod huggingface;
pub mod profile;

pub use huggingface::HuggingFaceBackend;
pub use profile::{default_backends, BackendConfig, BackendType};

/// Image generation client trait
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Generate an image for the prompt. May fail, and may never return.
    async fn invoke(&self, prompt: &str) -> Result<Vec<u8>, BackendError>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the backend kind
    fn kind(&self) -> &'static str;
}

/// A registered backend: stable identifier, display name and client handle.
#[derive(Clone)]
pub struct Backend {
    pub identifier: String,
    pub display_name: String,
    pub handle: Arc<dyn ImageBackend>,
}

impl Backend {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        handle: Arc<dyn ImageBackend>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            handle,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("identifier", &self.identifier)
            .field("display_name", &self.display_name)
            .field("model", &self.handle.model_name())
            .finish()
    }
}

/// Backend factory for creating clients from profiles
pub struct BackendFactory;

impl BackendFactory {
    pub fn create_client(
        config: &BackendConfig,
        token: &str,
    ) -> Result<Arc<dyn ImageBackend>, ApiError> {
        match config.backend_type {
            BackendType::HuggingFace => Ok(Arc::new(HuggingFaceBackend::new(
                config.model.clone(),
                token.to_string(),
                config.endpoint_or_default().to_string(),
                Duration::from_secs(config.client_timeout_secs),
            )?)),
        }
    }
}

/// Read the API token from the named environment variable.
pub fn load_token(env_var: &str) -> Result<String, ApiError> {
    match std::env::var(env_var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::CredentialsMissing(env_var.to_string())),
    }
}

/// The set of backends available for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Backend>,
}

impl BackendRegistry {
    /// Build a registry from already constructed backends. Identifiers must be unique.
    pub fn new(backends: Vec<Backend>) -> Result<Self, ApiError> {
        let mut seen = HashSet::new();
        for backend in &backends {
            if backend.identifier.trim().is_empty() {
                return Err(ApiError::ConfigError(
                    "Backend identifier cannot be empty".to_string(),
                ));
            }
            if !seen.insert(backend.identifier.as_str()) {
                return Err(ApiError::ConfigError(format!(
                    "Duplicate backend identifier: {}",
                    backend.identifier
                )));
            }
        }
        Ok(Self { backends })
    }

    /// Create clients for every configured backend, in identifier order.
    pub fn from_config(
        configs: &BTreeMap<String, BackendConfig>,
        token: &str,
    ) -> Result<Self, ApiError> {
        let mut backends = Vec::with_capacity(configs.len());
        for (identifier, config) in configs {
            config
                .validate()
                .map_err(|e| ApiError::ConfigError(format!("Backend '{}': {}", identifier, e)))?;
            let handle = BackendFactory::create_client(config, token)?;
            backends.push(Backend::new(
                identifier.clone(),
                config.display_name.clone(),
                handle,
            ));
        }
        Self::new(backends)
    }

    pub fn all(&self) -> &[Backend] {
        &self.backends
    }

    pub fn get(&self, identifier: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.identifier == identifier)
    }

    /// Resolve a selection of identifiers. Order follows the selection; repeats collapse.
    pub fn select<S: AsRef<str>>(&self, identifiers: &[S]) -> Result<Vec<Backend>, ApiError> {
        let mut selected: Vec<Backend> = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            let backend = self
                .get(identifier)
                .ok_or_else(|| ApiError::BackendNotFound(identifier.to_string()))?;
            if !selected.iter().any(|b| b.identifier == backend.identifier) {
                selected.push(backend.clone());
            }
        }
        Ok(selected)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
