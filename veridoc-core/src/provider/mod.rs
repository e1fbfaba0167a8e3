//! External service abstraction layer.
//!
//! This module defines the narrow contracts the pipeline consumes:
//! a reasoning/embedding [`Provider`] and a [`VisionClient`] for OCR.
//! Everything else in the crate talks to these services only through
//! these interfaces.

mod openai;
mod types;
mod vision;

// Re-export common types
pub use types::{CompletionRequest, ImagePayload, Provider, ProviderError, Result};

// Re-export client implementations
pub use openai::OpenAiProvider;
pub use vision::VisionClient;
