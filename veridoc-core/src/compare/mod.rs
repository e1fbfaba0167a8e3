//! Tolerance-aware comparison of a candidate document against the
//! reference, via the external reasoning service.
//!
//! The engine builds a structured request, sends it with rate-limit and
//! retry decorators, parses the response defensively, and re-derives
//! the aggregate status locally. The external service's own stated
//! status is advisory only.

pub mod policy;
mod parse;
mod prompt;
mod types;

pub use parse::{parse_analysis, ParseError};
pub use types::{AnalysisResult, DocumentKind, FieldComparison, OverallStatus, Severity};

use crate::config::Config;
use crate::limits::{RetryPolicy, SlidingWindowLimiter};
use crate::provider::{CompletionRequest, Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, CompareError>;

/// The candidate side of one comparison.
#[derive(Debug, Clone)]
pub enum CandidateContent<'a> {
    Text(&'a str),
    Image { base64: &'a str, mime_type: &'a str },
}

/// Runs structured comparisons through the reasoning service.
#[derive(Clone)]
pub struct ComparisonEngine {
    provider: Arc<dyn Provider>,
    model: String,
    retry: RetryPolicy,
    limiter: Option<Arc<SlidingWindowLimiter>>,
}

impl ComparisonEngine {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            retry: RetryPolicy::default(),
            limiter: None,
        }
    }

    /// Builds an engine parameterized by the loaded configuration:
    /// model from the llm section, backoff and rate ceiling from limits.
    pub fn from_config(provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self::new(provider, config.llm.model.clone())
            .with_retry(config.limits.retry_policy())
            .with_rate_limiter(Arc::new(config.limits.rate_limiter()))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<SlidingWindowLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Compares one candidate against the reference text.
    ///
    /// Transient service failures are retried; an unusable response
    /// degrades to a synthetic critical finding, never a silent pass.
    pub async fn compare(
        &self,
        reference_text: &str,
        candidate: CandidateContent<'_>,
        kind: DocumentKind,
    ) -> Result<AnalysisResult> {
        let request = self.build_request(reference_text, &candidate, kind);

        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        let raw = self
            .retry
            .run_when(
                || self.provider.complete(request.clone()),
                ProviderError::is_transient,
                |attempt, err| {
                    warn!(attempt, error = %err, kind = %kind, "retrying comparison call");
                },
            )
            .await?;

        Ok(self.interpret(&raw, kind))
    }

    fn build_request(
        &self,
        reference_text: &str,
        candidate: &CandidateContent<'_>,
        kind: DocumentKind,
    ) -> CompletionRequest {
        let system = prompt::system_instructions(kind);
        match candidate {
            CandidateContent::Text(text) => CompletionRequest::new(
                self.model.clone(),
                system,
                prompt::user_content(reference_text, text),
            ),
            CandidateContent::Image { base64, mime_type } => CompletionRequest::new(
                self.model.clone(),
                system,
                prompt::user_content_for_image(reference_text),
            )
            .with_image(*mime_type, *base64),
        }
    }

    /// Validates the raw response and re-derives the aggregate status.
    fn interpret(&self, raw: &str, kind: DocumentKind) -> AnalysisResult {
        let mut result = match parse_analysis(raw) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, kind = %kind, "discarding malformed comparison response");
                return AnalysisResult::rejected(
                    "The verification service returned an unusable response.",
                    format!("Response could not be validated: {err}"),
                );
            }
        };

        let derived = AnalysisResult::derive_status(&result.comparisons);
        if derived != result.overall_status {
            warn!(
                claimed = %result.overall_status,
                derived = %derived,
                kind = %kind,
                "service-reported status disagrees with local aggregation"
            );
        }
        result.overall_status = derived;
        result
    }
}
