//! Error types for the scenario harness and CLI.

use roadcare_core::DetectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Reading a request or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request or export JSON was malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request options failed validation
    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),
}
