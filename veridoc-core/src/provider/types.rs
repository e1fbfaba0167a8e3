//! Common types for external reasoning and embedding services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when interacting with a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing or invalid credentials. Raised at construction time and
    /// never retried.
    #[error("Provider misconfigured: {0}")]
    Configuration(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Whether the failure is worth retrying with backoff.
    ///
    /// Rate limiting, server errors, and network-level failures are
    /// transient; configuration and client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::Json(_) | Self::Other(_) => false,
            Self::Request(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider trait for the external reasoning and embedding services.
///
/// Implementations perform structured completions and generate embedding
/// vectors through HTTP backends.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run one completion and return the raw response text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;
}

/// Request for a structured completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    /// Base64-encoded images attached to the user turn, as data payloads
    /// for vision-capable models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImagePayload>>,
    pub temperature: f64,
}

/// One base64 image with its MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub base64: String,
}

impl CompletionRequest {
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            images: None,
            temperature: 0.0,
        }
    }

    pub fn with_image(mut self, mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        self.images.get_or_insert_with(Vec::new).push(ImagePayload {
            mime_type: mime_type.into(),
            base64: base64.into(),
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Api {
            status: 429,
            message: "rate limited".into()
        }
        .is_transient());
        assert!(ProviderError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(!ProviderError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_transient());
        assert!(!ProviderError::Configuration("no key".into()).is_transient());
    }

    #[test]
    fn request_builder_attaches_images() {
        let request = CompletionRequest::new("model", "sys", "user")
            .with_image("image/jpeg", "AAAA")
            .with_temperature(0.2);
        let images = request.images.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].mime_type, "image/jpeg");
        assert_eq!(request.temperature, 0.2);
    }
}
