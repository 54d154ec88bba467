//! Bounded-concurrency task scheduler
//!
//! A fixed pool of workers pulls items from a shared queue in list order. All
//! workers run as futures joined on the calling task, so their non-I/O code
//! never runs in parallel; they interleave only at await points. A worker
//! picks up the next item only after finishing its current one, which is what
//! bounds the number of items in flight.

use futures::future::join_all;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Result of a scheduling run
#[derive(Debug)]
pub struct ScheduleOutcome<T, R> {
    /// Worker results, in completion order
    pub completed: Vec<R>,

    /// Items never admitted because the run was cancelled
    pub unstarted: Vec<T>,

    /// Highest number of items in flight at any moment
    pub peak_in_flight: usize,
}

/// Fixed-size worker pool
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    concurrency: usize,
}

impl Scheduler {
    /// Creates a scheduler running at most `concurrency` items at once (minimum 1)
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `work` over every item and returns once all admitted items finish
    ///
    /// Items are admitted in order. Once `cancel` fires no further item is
    /// admitted, but items already running are awaited to completion. A
    /// failing item is just another result; it never stops its siblings.
    pub async fn run<T, R, F, Fut>(
        &self,
        items: Vec<T>,
        cancel: &CancellationToken,
        work: F,
    ) -> ScheduleOutcome<T, R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let total = items.len();
        let worker_count = self.concurrency.min(total);

        let queue = Mutex::new(VecDeque::from(items));
        let completed = Mutex::new(Vec::with_capacity(total));
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        tracing::debug!("Scheduling {} tasks on {} workers", total, worker_count);

        let workers = (0..worker_count).map(|worker| {
            let (queue, completed, in_flight, peak, work) =
                (&queue, &completed, &in_flight, &peak, &work);

            async move {
                loop {
                    if cancel.is_cancelled() {
                        tracing::debug!("Worker {} stopping, admission closed", worker);
                        break;
                    }

                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                    let Some(item) = next else {
                        break;
                    };

                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);

                    let result = work(item).await;

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    completed
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(result);
                }
            }
        });

        join_all(workers).await;

        let completed = completed.into_inner().unwrap_or_else(PoisonError::into_inner);
        let unstarted: Vec<T> = queue
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .collect();

        tracing::debug!(
            "Scheduler done: {} completed, {} not started",
            completed.len(),
            unstarted.len()
        );

        ScheduleOutcome {
            completed,
            unstarted,
            peak_in_flight: peak.load(Ordering::SeqCst),
        }
    }
}
