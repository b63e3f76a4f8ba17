//! Hosted inference API client: text prompt in, image bytes out.

use crate::backend::ImageBackend;
use crate::error::{ApiError, BackendError, BackendErrorKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct TextToImageRequest<'a> {
    inputs: &'a str,
}

/// Map transport errors to backend errors
fn map_http_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::new(
            BackendErrorKind::Request,
            format!("Request timeout: {}", error),
        )
    } else if error.is_connect() {
        BackendError::new(
            BackendErrorKind::Request,
            format!("Connection error: {}", error),
        )
    } else {
        BackendError::other(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, body: &str) -> BackendError {
    let kind = match status {
        401 | 403 => BackendErrorKind::Auth,
        404 => BackendErrorKind::ModelNotFound,
        429 => BackendErrorKind::RateLimited,
        503 => BackendErrorKind::ModelLoading,
        _ => BackendErrorKind::Request,
    };
    BackendError::new(kind, format!("Request failed with status {}: {}", status, body))
}

/// Client for a single model on the hosted inference API
pub struct HuggingFaceBackend {
    client: Client,
    model: String,
    token: String,
    endpoint: String,
}

impl HuggingFaceBackend {
    pub fn new(
        model: String,
        token: String,
        endpoint: String,
        client_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(client_timeout)
            .build()
            .map_err(|e| ApiError::BackendError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            model,
            token,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}", self.endpoint, self.model)
    }
}

#[async_trait]
impl ImageBackend for HuggingFaceBackend {
    async fn invoke(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.token)
            .header("Accept", "image/png")
            .json(&TextToImageRequest { inputs: prompt })
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status.as_u16(), &error_text));
        }

        // Errors sometimes come back as JSON with a 200.
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);

        let bytes = response.bytes().await.map_err(map_http_error)?;
        if is_json {
            return Err(BackendError::new(
                BackendErrorKind::Decode,
                format!(
                    "Expected image bytes, got JSON: {}",
                    String::from_utf8_lossy(&bytes)
                ),
            ));
        }
        if bytes.is_empty() {
            return Err(BackendError::new(
                BackendErrorKind::Decode,
                "Empty response body",
            ));
        }

        Ok(bytes.to_vec())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn kind(&self) -> &'static str {
        "huggingface"
    }
}
