//! Order-preserving batch execution with rate limiting and bounded parallelism.

use super::rate::SlidingWindowLimiter;
use super::runner::BoundedRunner;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;

/// Applies an async function to every item of a list, composing the
/// configured rate limiter (if any) and the bounded runner around each
/// call.
///
/// Results come back in input order regardless of completion order, and
/// `(completed, total)` progress is reported after each item settles.
pub struct BatchProcessor {
    runner: BoundedRunner,
    limiter: Option<Arc<SlidingWindowLimiter>>,
}

impl BatchProcessor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            runner: BoundedRunner::new(max_concurrent),
            limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<SlidingWindowLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Processes all items concurrently, failing fast on the first error.
    pub async fn process_all<T, R, E, F, Fut, C>(
        &self,
        items: Vec<T>,
        op: F,
        mut on_progress: C,
    ) -> Result<Vec<R>, E>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        C: FnMut(usize, usize),
    {
        let total = items.len();
        let op = &op;
        let mut in_flight = FuturesUnordered::new();

        for (index, item) in items.into_iter().enumerate() {
            in_flight.push(async move {
                if let Some(limiter) = &self.limiter {
                    limiter.acquire().await;
                }
                let _permit = self.runner.acquire().await;
                (index, op(item).await)
            });
        }

        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut completed = 0usize;
        while let Some((index, result)) = in_flight.next().await {
            slots[index] = Some(result?);
            completed += 1;
            on_progress(completed, total);
        }
        drop(in_flight);

        debug_assert!(slots.iter().all(Option::is_some));
        Ok(slots.into_iter().flatten().collect())
    }

    /// Processes items in fixed-size sequential batches.
    ///
    /// Items within a batch run concurrently, but no two batches overlap.
    /// Useful when downstream calls must not cross batch boundaries.
    pub async fn process_batched<T, R, E, F, Fut, C>(
        &self,
        items: Vec<T>,
        batch_size: usize,
        op: F,
        mut on_progress: C,
    ) -> Result<Vec<R>, E>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        T: Send,
        C: FnMut(usize, usize),
    {
        let total = items.len();
        let batch_size = batch_size.max(1);
        let mut results = Vec::with_capacity(total);
        let mut items = items.into_iter();

        loop {
            let batch: Vec<T> = items.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let done_so_far = results.len();
            let batch_results = self
                .process_all(batch, &op, |done_in_batch, _| {
                    on_progress(done_so_far + done_in_batch, total)
                })
                .await?;
            results.extend(batch_results);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn preserves_input_order_despite_completion_order() {
        let processor = BatchProcessor::new(4);
        let items: Vec<u64> = vec![5, 1, 4, 2, 3];

        let results = processor
            .process_all(
                items.clone(),
                |n| async move {
                    // Later items finish first.
                    tokio::time::sleep(Duration::from_millis(n * 2)).await;
                    Ok::<u64, ()>(n * 10)
                },
                |_, _| {},
            )
            .await
            .unwrap();

        assert_eq!(results, vec![50, 10, 40, 20, 30]);
    }

    #[tokio::test]
    async fn reports_progress_after_each_item() {
        let processor = BatchProcessor::new(2);
        let mut seen = Vec::new();

        processor
            .process_all(
                vec![1, 2, 3],
                |n| async move { Ok::<i32, ()>(n) },
                |done, total| seen.push((done, total)),
            )
            .await
            .unwrap();

        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn propagates_first_error() {
        let processor = BatchProcessor::new(2);
        let result = processor
            .process_all(
                vec![1, 2, 3],
                |n| async move {
                    if n == 2 {
                        Err("bad item")
                    } else {
                        Ok(n)
                    }
                },
                |_, _| {},
            )
            .await;

        assert_eq!(result, Err("bad item"));
    }

    #[tokio::test]
    async fn batched_mode_keeps_order_and_counts() {
        let processor = BatchProcessor::new(8);
        let items: Vec<u32> = (0..7).collect();
        let mut last = (0, 0);

        let results = processor
            .process_batched(
                items,
                3,
                |n| async move { Ok::<u32, ()>(n + 100) },
                |done, total| last = (done, total),
            )
            .await
            .unwrap();

        assert_eq!(results, (0..7).map(|n| n + 100).collect::<Vec<_>>());
        assert_eq!(last, (7, 7));
    }
}
