//! Boundary between the post generation core and whatever model backs it.

use async_trait::async_trait;
use thiserror::Error;

/// Upstream text generation failed. Fatal for the request that triggered it.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("generation service error{}: {message}", .status.map(|s| format!(" (http {s})")).unwrap_or_default())]
pub struct GenerationServiceError {
    /// HTTP status of the upstream response, when one was received.
    pub status: Option<u16>,
    pub message: String,
}

impl GenerationServiceError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// A service that turns one prompt into one completion.
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationServiceError>;
}
