//! veridoc-core - Document verification engine
//!
//! Provides the components for verifying candidate documents against a
//! reference order:
//! - Text extraction (plain text, PDF, OCR fallback for scans)
//! - Image normalization for vision-capable services
//! - Semantic retrieval (chunking, embeddings, similarity search)
//! - Concurrency limits shared by every external call
//! - Tolerance-aware comparison via an external reasoning service
//! - Run orchestration with progress and cancellation
//!
//! ## Primary API
//!
//! Users should drive verification runs via the `Orchestrator` API.

// Public modules
pub mod compare;
pub mod config;
pub mod extract;
pub mod limits;
pub mod ocr;
pub mod provider;
pub mod retrieval;
pub mod verify;

// Public exports
pub use compare::{
    AnalysisResult, CandidateContent, ComparisonEngine, DocumentKind, FieldComparison,
    OverallStatus, Severity,
};
pub use config::{Config, LimitsConfig};
pub use extract::{DocumentFile, Extraction, ImageNormalizer, TextExtractor};
pub use ocr::OcrAdapter;
pub use retrieval::{Chunker, DocumentChunk, Embedder, RetrievalIndex, SearchResult};
pub use verify::{Candidate, Orchestrator, Phase, Progress, VerificationReport, VerifyError};

// Provider exports
pub use provider::{
    CompletionRequest, OpenAiProvider, Provider, ProviderError, VisionClient,
};

// Limits exports
pub use limits::{BatchProcessor, BoundedRunner, RetryPolicy, SlidingWindowLimiter};
