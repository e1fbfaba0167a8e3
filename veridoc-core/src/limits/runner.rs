//! Bounded-parallelism task runner.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admits at most `max_concurrent` in-flight tasks.
///
/// Additional submissions wait for a permit and are released as running
/// tasks complete. Built on [`tokio::sync::Semaphore`], which queues
/// waiters in FIFO order - a stricter guarantee than the best-effort
/// release order of a hand-rolled promise queue.
#[derive(Clone)]
pub struct BoundedRunner {
    semaphore: Arc<Semaphore>,
}

impl BoundedRunner {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Waits for a free slot and holds it until the permit is dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        // The semaphore is owned by this runner and never closed.
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("runner semaphore never closed")
    }

    /// Runs one task inside a permit.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let _permit = self.acquire().await;
        task.await
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn caps_in_flight_tasks() {
        let runner = BoundedRunner::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let runner = runner.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                runner
                    .run(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn releases_permits_after_completion() {
        let runner = BoundedRunner::new(1);
        runner.run(async {}).await;
        runner.run(async {}).await;
        assert_eq!(runner.available(), 1);
    }
}
