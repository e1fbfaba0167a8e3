//! Sliding-window rate limiter for per-minute API ceilings.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Tracks request timestamps inside a sliding window.
///
/// Before admitting a request, timestamps older than the window are
/// pruned. When the window is full, the caller sleeps until the oldest
/// timestamp exits the window and re-checks, so bursts never exceed
/// `max_requests` per `window`.
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Waits until the current request may proceed, then records it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.timestamps.lock().await;
                let now = Instant::now();
                while let Some(front) = stamps.front() {
                    if now.duration_since(*front) >= self.window {
                        stamps.pop_front();
                    } else {
                        break;
                    }
                }
                if stamps.len() < self.max_requests {
                    stamps.push_back(now);
                    return;
                }
                // Delay until the oldest timestamp leaves the window.
                match stamps.front() {
                    Some(front) => self.window.saturating_sub(now.duration_since(*front)),
                    None => Duration::ZERO,
                }
            };
            tracing::debug!(delay_ms = wait.as_millis() as u64, "rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
