//! Vision service client for document-text detection.
//!
//! Wraps the external OCR/vision API: one `images:annotate` call with the
//! `DOCUMENT_TEXT_DETECTION` feature returns the concatenated detected
//! text of the submitted image.

use super::types::{ProviderError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com";

/// HTTP client for the external vision service.
#[derive(Debug, Clone)]
pub struct VisionClient {
    endpoint: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl VisionClient {
    /// Creates a new client, failing fast when credentials are missing.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "missing API key for vision service".to_string(),
            ));
        }
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            http_client: reqwest::Client::new(),
        })
    }

    /// Runs document-text detection over one base64 image.
    ///
    /// Returns the full detected text, or an empty string when the
    /// service found nothing.
    pub async fn detect_document_text(
        &self,
        image_base64: &str,
        language_hints: &[String],
    ) -> Result<String> {
        let url = format!("{}/v1/images:annotate?key={}", self.endpoint, self.api_key);

        let body = AnnotateBatchRequest {
            requests: vec![AnnotateRequest {
                image: AnnotateImage {
                    content: image_base64.to_string(),
                },
                features: vec![Feature {
                    feature_type: "DOCUMENT_TEXT_DETECTION".to_string(),
                }],
                image_context: ImageContext {
                    language_hints: language_hints.to_vec(),
                },
            }],
        };

        let response = self.http_client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response.json::<AnnotateBatchResponse>().await?;
        let first = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Other("vision service returned no responses".into()))?;

        if let Some(error) = first.error {
            return Err(ProviderError::Api {
                status: error.code,
                message: error.message,
            });
        }

        Ok(first
            .full_text_annotation
            .map(|annotation| annotation.text)
            .unwrap_or_default())
    }
}

// Vision-specific request/response types (internal)

#[derive(Debug, Serialize)]
struct AnnotateBatchRequest {
    requests: Vec<AnnotateRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest {
    image: AnnotateImage,
    features: Vec<Feature>,
    image_context: ImageContext,
}

#[derive(Debug, Serialize)]
struct AnnotateImage {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotateBatchResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}
