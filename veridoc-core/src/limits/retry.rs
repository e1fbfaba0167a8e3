//! Exponential-backoff retry for fallible async operations.

use std::future::Future;
use std::time::Duration;

/// Retries an operation up to `max_retries` times.
///
/// The delay before attempt k+1 is `min(initial_delay * 2^k, max_delay)`.
/// The last error is returned once retries are exhausted.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt as u32);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Retries every error. See [`Self::run_when`] for selective retries.
    pub async fn run<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_when(op, |_| true, |_, _| {}).await
    }

    /// Retries only while `should_retry` holds, invoking `on_retry` with
    /// the 1-based retry number and the error before each backoff sleep.
    pub async fn run_when<F, Fut, T, E, P, C>(
        &self,
        mut op: F,
        should_retry: P,
        mut on_retry: C,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        C: FnMut(usize, &E),
    {
        let mut attempt = 0usize;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_retries || !should_retry(&err) {
                        return Err(err);
                    }
                    on_retry(attempt + 1, &err);
                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn exhausts_retries_and_returns_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let result: Result<(), &str> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("permanent failure")
                }
            })
            .await;

        assert_eq!(result, Err("permanent failure"));
        // Initial attempt + 3 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Delays: 100ms + 200ms + 400ms.
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn caps_delay_at_max() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), Duration::from_millis(250));
        let start = Instant::now();

        let result: Result<(), ()> = policy.run(|| async { Err(()) }).await;
        assert!(result.is_err());
        // Delays: 100 + 200 + 250 + 250.
        assert_eq!(start.elapsed(), Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_attempt_numbers_before_each_sleep() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10), Duration::from_secs(1));
        let mut seen = Vec::new();

        let result: Result<(), &str> = policy
            .run_when(
                || async { Err("boom") },
                |_| true,
                |attempt, _err| seen.push(attempt),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_when_predicate_rejects() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<(), &str> = policy
            .run_when(
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err("fatal")
                    }
                },
                |_| false,
                |_, _| {},
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1), Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<usize, &str> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
    }
}
