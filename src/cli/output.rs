//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::CredentialsMissing(var) => format!(
            "{}\nExport a Hugging Face token, e.g. `export {}=hf_...`",
            e, var
        ),
        _ => e.to_string(),
    }
}

/// Reject anything but the two supported output formats.
pub fn check_format(format: &str) -> Result<(), ApiError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(ApiError::InvalidRequest(format!(
            "Unknown output format '{}' (expected 'text' or 'json')",
            other
        ))),
    }
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode output: {}", e)))
}
