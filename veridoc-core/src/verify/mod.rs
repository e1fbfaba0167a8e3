//! Verification run orchestration.
//!
//! Drives one run across a reference document and N candidate
//! documents: extract the reference, then for each candidate extract or
//! normalize, compare through the reasoning service, and aggregate.
//!
//! State machine: `Idle -> ExtractingReference -> {ExtractingCandidate
//! -> Comparing}* -> Aggregating -> Completed | Failed`. Only reference
//! extraction failure or an empty candidate set aborts the run; a
//! single candidate's failure is isolated as a rejected entry.

use crate::compare::{
    AnalysisResult, CandidateContent, ComparisonEngine, DocumentKind, OverallStatus,
};
use crate::extract::{DocumentFile, ExtractError, Extraction, ImageNormalizer, TextExtractor};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Phases of one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ExtractingReference,
    ExtractingCandidate,
    Comparing,
    Aggregating,
    Completed,
    Failed,
}

/// Progress snapshot reported as the run advances.
#[derive(Debug, Clone)]
pub struct Progress {
    pub phase: Phase,
    pub completed: usize,
    pub total: usize,
    pub percent: f32,
}

/// A candidate document with its declared kind.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub file: DocumentFile,
    pub kind: DocumentKind,
}

/// Per-candidate outcome.
#[derive(Debug, Clone)]
pub struct CandidateReport {
    pub name: String,
    pub kind: DocumentKind,
    pub analysis: AnalysisResult,
}

/// Final report of one verification run.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub reference_name: String,
    pub overall_status: OverallStatus,
    pub candidates: Vec<CandidateReport>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("reference extraction failed: {0}")]
    ReferenceExtraction(#[source] ExtractError),

    #[error("reference document yielded no usable text")]
    ReferenceUnreadable,

    #[error("no candidate documents supplied")]
    NoCandidates,

    #[error("verification run was cancelled")]
    Cancelled,
}

type ProgressCallback = Box<dyn Fn(Progress) + Send + Sync>;

/// Runs one verification across a reference and its candidates.
pub struct Orchestrator {
    extractor: TextExtractor,
    normalizer: ImageNormalizer,
    engine: ComparisonEngine,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
}

impl Orchestrator {
    pub fn new(
        extractor: TextExtractor,
        normalizer: ImageNormalizer,
        engine: ComparisonEngine,
    ) -> Self {
        Self {
            extractor,
            normalizer,
            engine,
            cancel: CancellationToken::new(),
            on_progress: None,
        }
    }

    /// Installs a progress observer.
    pub fn with_progress(mut self, callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Uses an externally owned cancellation token. Cancellation is
    /// checked before every external call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn run(
        &self,
        reference: DocumentFile,
        candidates: Vec<Candidate>,
    ) -> Result<VerificationReport, VerifyError> {
        if candidates.is_empty() {
            self.report(Phase::Failed, 0, 0);
            return Err(VerifyError::NoCandidates);
        }
        let total = candidates.len();

        self.report(Phase::ExtractingReference, 0, total);
        self.check_cancelled()?;
        let reference_text = match self.extractor.extract(&reference).await {
            Ok(Extraction::Text(text)) => text,
            Ok(_) => {
                self.report(Phase::Failed, 0, total);
                return Err(VerifyError::ReferenceUnreadable);
            }
            Err(err) => {
                self.report(Phase::Failed, 0, total);
                return Err(VerifyError::ReferenceExtraction(err));
            }
        };
        info!(reference = %reference.name, candidates = total, "verification run started");

        let mut reports = Vec::with_capacity(total);
        for (index, candidate) in candidates.into_iter().enumerate() {
            self.report(Phase::ExtractingCandidate, index, total);
            let analysis = self.verify_candidate(&reference_text, &candidate).await?;
            reports.push(CandidateReport {
                name: candidate.file.name.clone(),
                kind: candidate.kind,
                analysis,
            });
            self.report(Phase::Comparing, index + 1, total);
        }

        self.report(Phase::Aggregating, total, total);
        let overall_status = aggregate_status(&reports);
        info!(status = %overall_status, "verification run completed");
        self.report(Phase::Completed, total, total);

        Ok(VerificationReport {
            reference_name: reference.name,
            overall_status,
            candidates: reports,
        })
    }

    /// Verifies one candidate, isolating its failures as a rejected
    /// analysis. Only cancellation propagates as an error.
    async fn verify_candidate(
        &self,
        reference_text: &str,
        candidate: &Candidate,
    ) -> Result<AnalysisResult, VerifyError> {
        self.check_cancelled()?;
        let name = &candidate.file.name;

        if candidate.file.is_image() {
            let normalized = match self.normalizer.process(&candidate.file) {
                Ok(normalized) => normalized,
                Err(err) => {
                    warn!(candidate = %name, error = %err, "image normalization failed");
                    return Ok(AnalysisResult::rejected(
                        format!("Could not process image document '{name}'."),
                        err.to_string(),
                    ));
                }
            };
            self.check_cancelled()?;
            return Ok(self
                .compare_isolated(
                    reference_text,
                    CandidateContent::Image {
                        base64: &normalized.base64,
                        mime_type: &normalized.mime_type,
                    },
                    candidate,
                )
                .await);
        }

        let text = match self.extractor.extract(&candidate.file).await {
            Ok(Extraction::Text(text)) => text,
            Ok(Extraction::NoExtractableText) => {
                return Ok(AnalysisResult::rejected(
                    format!("No extractable text in candidate '{name}'."),
                    "The document has no text layer and OCR produced nothing.",
                ));
            }
            Ok(Extraction::ImageDocument) => {
                // Unreachable for non-image MIME types; treat as unusable.
                return Ok(AnalysisResult::rejected(
                    format!("Candidate '{name}' could not be read as text."),
                    "Unexpected image signal for a non-image document.",
                ));
            }
            Err(err) => {
                warn!(candidate = %name, error = %err, "candidate extraction failed");
                return Ok(AnalysisResult::rejected(
                    format!("Extraction failed for candidate '{name}'."),
                    err.to_string(),
                ));
            }
        };

        self.check_cancelled()?;
        Ok(self
            .compare_isolated(reference_text, CandidateContent::Text(&text), candidate)
            .await)
    }

    async fn compare_isolated(
        &self,
        reference_text: &str,
        content: CandidateContent<'_>,
        candidate: &Candidate,
    ) -> AnalysisResult {
        match self
            .engine
            .compare(reference_text, content, candidate.kind)
            .await
        {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(candidate = %candidate.file.name, error = %err, "comparison failed");
                AnalysisResult::rejected(
                    format!(
                        "Verification service failed for candidate '{}'.",
                        candidate.file.name
                    ),
                    err.to_string(),
                )
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), VerifyError> {
        if self.cancel.is_cancelled() {
            Err(VerifyError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn report(&self, phase: Phase, completed: usize, total: usize) {
        if let Some(callback) = &self.on_progress {
            let percent = if total == 0 {
                0.0
            } else {
                completed as f32 / total as f32 * 100.0
            };
            callback(Progress {
                phase,
                completed,
                total,
                percent,
            });
        }
    }
}

/// Any rejected candidate rejects the run; else any warning warns.
fn aggregate_status(reports: &[CandidateReport]) -> OverallStatus {
    if reports
        .iter()
        .any(|r| r.analysis.overall_status == OverallStatus::Rejected)
    {
        OverallStatus::Rejected
    } else if reports
        .iter()
        .any(|r| r.analysis.overall_status == OverallStatus::Warning)
    {
        OverallStatus::Warning
    } else {
        OverallStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::RetryPolicy;
    use crate::provider::{CompletionRequest, Provider, ProviderError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Provider answering every comparison with the same canned JSON.
    struct CannedProvider {
        response: String,
    }

    #[async_trait]
    impl Provider for CannedProvider {
        async fn complete(&self, _request: CompletionRequest) -> crate::provider::Result<String> {
            Ok(self.response.clone())
        }

        async fn embed(&self, _text: &str, _model: &str) -> crate::provider::Result<Vec<f32>> {
            Err(ProviderError::Other("not used".into()))
        }
    }

    fn canned_engine(severity: &str, status: &str) -> ComparisonEngine {
        let response = format!(
            r#"{{
                "comparisons": [{{
                    "field": "total_amount",
                    "piValue": "100.00",
                    "documentValue": "100.00",
                    "match": true,
                    "confidence": 0.99,
                    "severity": "{severity}",
                    "explanation": "canned"
                }}],
                "overallStatus": "{status}",
                "summary": "canned"
            }}"#
        );
        ComparisonEngine::new(Arc::new(CannedProvider { response }), "test-model").with_retry(
            RetryPolicy::new(0, Duration::from_millis(1), Duration::from_millis(1)),
        )
    }

    fn orchestrator(severity: &str, status: &str) -> Orchestrator {
        Orchestrator::new(
            TextExtractor::new(),
            ImageNormalizer::new(),
            canned_engine(severity, status),
        )
    }

    fn text_candidate(name: &str, body: &str) -> Candidate {
        Candidate {
            file: DocumentFile::new(name, "text/plain", body.as_bytes().to_vec()),
            kind: DocumentKind::Invoice,
        }
    }

    fn reference() -> DocumentFile {
        DocumentFile::new("order.txt", "text/plain", b"order number 42".to_vec())
    }

    #[tokio::test]
    async fn empty_candidate_set_fails() {
        let result = orchestrator("info", "approved")
            .run(reference(), vec![])
            .await;
        assert!(matches!(result, Err(VerifyError::NoCandidates)));
    }

    #[tokio::test]
    async fn reference_extraction_failure_aborts() {
        let bad_reference =
            DocumentFile::new("order.xlsx", "application/vnd.ms-excel", vec![0u8; 4]);
        let result = orchestrator("info", "approved")
            .run(bad_reference, vec![text_candidate("a.txt", "x")])
            .await;
        assert!(matches!(result, Err(VerifyError::ReferenceExtraction(_))));
    }

    #[tokio::test]
    async fn all_clean_candidates_approve_the_run() {
        let report = orchestrator("info", "approved")
            .run(
                reference(),
                vec![
                    text_candidate("invoice.txt", "invoice body"),
                    text_candidate("proof.txt", "proof body"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.overall_status, OverallStatus::Approved);
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.reference_name, "order.txt");
    }

    #[tokio::test]
    async fn one_bad_candidate_is_isolated_and_rejects_the_run() {
        let report = orchestrator("info", "approved")
            .run(
                reference(),
                vec![
                    text_candidate("good.txt", "fine"),
                    Candidate {
                        file: DocumentFile::new("weird.xlsx", "application/vnd.ms-excel", vec![]),
                        kind: DocumentKind::Invoice,
                    },
                ],
            )
            .await
            .unwrap();

        // The run completed despite the broken candidate.
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(
            report.candidates[1].analysis.overall_status,
            OverallStatus::Rejected
        );
        assert_eq!(report.overall_status, OverallStatus::Rejected);
    }

    #[tokio::test]
    async fn warning_candidates_warn_the_run() {
        let report = orchestrator("warning", "warning")
            .run(reference(), vec![text_candidate("invoice.txt", "body")])
            .await
            .unwrap();
        assert_eq!(report.overall_status, OverallStatus::Warning);
    }

    #[tokio::test]
    async fn progress_advances_through_the_run() {
        let seen: Arc<Mutex<Vec<(Phase, f32)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let orchestrator = orchestrator("info", "approved").with_progress(move |progress| {
            sink.lock().unwrap().push((progress.phase, progress.percent));
        });

        orchestrator
            .run(
                reference(),
                vec![
                    text_candidate("a.txt", "a"),
                    text_candidate("b.txt", "b"),
                ],
            )
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().map(|(p, _)| *p), Some(Phase::ExtractingReference));
        assert_eq!(seen.last().map(|(p, _)| *p), Some(Phase::Completed));
        assert!(seen.contains(&(Phase::Comparing, 50.0)));
        assert!(seen.contains(&(Phase::Comparing, 100.0)));
        // Percentages never regress within comparing phases.
        let percents: Vec<f32> = seen
            .iter()
            .filter(|(p, _)| *p == Phase::Comparing)
            .map(|(_, pct)| *pct)
            .collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn cancellation_stops_the_run() {
        let token = CancellationToken::new();
        token.cancel();
        let result = orchestrator("info", "approved")
            .with_cancellation(token)
            .run(reference(), vec![text_candidate("a.txt", "a")])
            .await;
        assert!(matches!(result, Err(VerifyError::Cancelled)));
    }
}
