//! OCR adapter over the external vision service.

use crate::config::Config;
use crate::limits::RetryPolicy;
use crate::provider::{ProviderError, VisionClient};

/// Turns an image into text via document-text detection.
///
/// Transient API failures are retried with exponential backoff;
/// configuration errors surface immediately at [`VisionClient`]
/// construction and are never retried.
#[derive(Clone)]
pub struct OcrAdapter {
    vision: VisionClient,
    language_hints: Vec<String>,
    retry: RetryPolicy,
}

impl OcrAdapter {
    pub fn new(vision: VisionClient, language_hints: Vec<String>) -> Self {
        Self {
            vision,
            language_hints,
            retry: RetryPolicy::default(),
        }
    }

    /// Builds an adapter parameterized by the loaded configuration:
    /// language hints from the ocr section, backoff from limits.
    pub fn from_config(vision: VisionClient, config: &Config) -> Self {
        Self::new(vision, config.ocr.language_hints.clone())
            .with_retry(config.limits.retry_policy())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Recognizes text in one base64-encoded image.
    ///
    /// Returns an empty string when the service detected nothing.
    pub async fn recognize(&self, image_base64: &str) -> Result<String, ProviderError> {
        self.retry
            .run_when(
                || self.vision.detect_document_text(image_base64, &self.language_hints),
                ProviderError::is_transient,
                |attempt, err| {
                    tracing::warn!(attempt, error = %err, "retrying OCR call");
                },
            )
            .await
    }
}
