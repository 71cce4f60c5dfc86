//! Round-based scheduler with a bounded worker pool
//!
//! This module handles:
//! - Draining the frontier one round at a time
//! - Global concurrency limiting via a semaphore
//! - Skipping URLs that were already dispatched
//! - The politeness pause between rounds
//! - Cancellation and fatal-error shutdown

use crate::crawler::frontier::{Frontier, WorkItem};
use crate::TrawlError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// What the scheduler did during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Rounds that dispatched at least one item
    pub rounds: u64,
    /// Items handed to the worker
    pub dispatched: u64,
    /// Items dropped because their URL was already visited
    pub skipped: u64,
    /// Whether the run stopped because of cancellation
    pub cancelled: bool,
}

/// Dispatches frontier items to workers, at most `pool_size` at a time
///
/// The scheduler coordinates:
/// - Global concurrency limits (the worker pool size)
/// - Round boundaries (items discovered during a round run in the next one)
/// - A fixed pause between rounds while work remains
pub struct Scheduler {
    frontier: Arc<Frontier>,
    pool: Arc<Semaphore>,
    politeness: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `frontier` - Shared queue of pending items
    /// * `pool_size` - Maximum number of workers running at once
    /// * `politeness` - Pause between rounds
    pub fn new(frontier: Arc<Frontier>, pool_size: usize, politeness: Duration) -> Self {
        Self {
            frontier,
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
            politeness,
        }
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    /// Runs rounds until the frontier is empty, `cancel` fires, or a worker
    /// returns an error
    ///
    /// Each worker returns the follow-up items it discovered; they are queued
    /// for the next round. A worker error stops new dispatches at once, even
    /// within the current round, lets the in-flight workers finish, and is
    /// then returned.
    pub async fn run<F, Fut>(
        &self,
        worker: F,
        cancel: &CancellationToken,
    ) -> Result<SchedulerReport, TrawlError>
    where
        F: Fn(WorkItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<WorkItem>, TrawlError>> + Send + 'static,
    {
        let worker = Arc::new(worker);
        let halt = cancel.child_token();
        let dispatched = Arc::new(AtomicU64::new(0));
        let skipped = Arc::new(AtomicU64::new(0));
        let mut report = SchedulerReport::default();
        let mut failure: Option<TrawlError> = None;

        loop {
            if halt.is_cancelled() {
                break;
            }

            let round = self.frontier.take_round();
            if round.is_empty() {
                break;
            }
            report.rounds += 1;
            tracing::debug!("Round {}: {} items", report.rounds, round.len());

            let mut tasks = JoinSet::new();
            for item in round {
                let permit = tokio::select! {
                    biased;
                    _ = halt.cancelled() => break,
                    permit = self.pool.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let worker = Arc::clone(&worker);
                let frontier = Arc::clone(&self.frontier);
                let halt = halt.clone();
                let dispatched = Arc::clone(&dispatched);
                let skipped = Arc::clone(&skipped);

                tasks.spawn(async move {
                    let _permit = permit;
                    if halt.is_cancelled() {
                        return Ok(());
                    }
                    if !frontier.mark_visited(&item) {
                        tracing::debug!("Already visited: {}", item.url());
                        skipped.fetch_add(1, Ordering::Relaxed);
                        return Ok(());
                    }

                    dispatched.fetch_add(1, Ordering::Relaxed);
                    match worker(item).await {
                        Ok(discovered) => {
                            frontier.extend(discovered);
                            Ok(())
                        }
                        Err(e) => {
                            // Cancel before the permit is released so no queued item starts
                            halt.cancel();
                            Err(e)
                        }
                    }
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let outcome = joined.map_err(TrawlError::from).and_then(|result| result);
                if let Err(e) = outcome {
                    tracing::error!("Worker failed, stopping crawl: {}", e);
                    halt.cancel();
                    failure.get_or_insert(e);
                }
            }

            if let Some(e) = failure.take() {
                return Err(e);
            }

            if self.frontier.is_empty() || halt.is_cancelled() {
                continue;
            }

            tracing::debug!(
                "Sleeping {:?} before next round ({} pending)",
                self.politeness,
                self.frontier.pending_count()
            );
            tokio::select! {
                _ = halt.cancelled() => {}
                _ = tokio::time::sleep(self.politeness) => {}
            }
        }

        report.dispatched = dispatched.load(Ordering::Relaxed);
        report.skipped = skipped.load(Ordering::Relaxed);
        report.cancelled = cancel.is_cancelled();
        if report.cancelled {
            tracing::warn!("Crawl cancelled with {} items pending", self.frontier.pending_count());
        }
        Ok(report)
    }
}
