//! Concurrency control for rate-limited, occasionally-unreliable external APIs.
//!
//! The external reasoning, embedding, and OCR services impose per-minute
//! request ceilings and fail transiently. Bulk operations (embedding every
//! chunk of a collection, comparing many candidate documents) go through
//! these four primitives so they neither trip limits nor hard-fail on a
//! single transient error:
//!
//! - [`BoundedRunner`]: at most N tasks in flight.
//! - [`SlidingWindowLimiter`]: at most N requests per window.
//! - [`BatchProcessor`]: order-preserving fan-out composing the two above.
//! - [`RetryPolicy`]: exponential backoff for transient failures.
//!
//! The primitives are orthogonal decorators; callers compose them
//! explicitly (rate limit outside, retry inside, or vice versa).

mod batch;
mod rate;
mod retry;
mod runner;

pub use batch::BatchProcessor;
pub use rate::SlidingWindowLimiter;
pub use retry::RetryPolicy;
pub use runner::BoundedRunner;
