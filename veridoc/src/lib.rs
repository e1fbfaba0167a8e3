//! veridoc - Document verification against reference orders
//!
//! This is the convenience wrapper crate that re-exports the veridoc
//! engine components for easy usage.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! veridoc = "0.1"
//! ```

// Re-export core
pub use veridoc_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use veridoc_core::{
        AnalysisResult, Candidate, CandidateContent, ComparisonEngine, Config, DocumentFile,
        DocumentKind, Orchestrator, OverallStatus, Provider, Severity, VerificationReport,
    };
}
