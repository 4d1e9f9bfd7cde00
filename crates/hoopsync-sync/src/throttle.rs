use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::{AggregateError, SyncError};

/// What to do with tasks submitted after a sibling has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutPolicy {
    /// Keep going; every failure is collected.
    #[default]
    CollectAll,
    /// Skip tasks submitted once any failure has been observed. Tasks already
    /// in flight run to completion.
    FailFast,
}

impl std::str::FromStr for FanOutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collect" | "collect-all" => Ok(Self::CollectAll),
            "fail-fast" | "failfast" => Ok(Self::FailFast),
            other => Err(format!("unknown fan-out policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleStats {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Runs submitted tasks with at most `capacity` in flight.
///
/// [`Throttler::run`] applies backpressure: it only waits while the group is
/// full. [`Throttler::wait`] drains the group and reports every failure.
#[derive(Debug)]
pub struct Throttler {
    limit: Arc<Semaphore>,
    tasks: JoinSet<Result<(), SyncError>>,
    policy: FanOutPolicy,
    tripped: Arc<AtomicBool>,
    failures: Vec<SyncError>,
    stats: ThrottleStats,
}

impl Throttler {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, FanOutPolicy::default())
    }

    pub fn with_policy(capacity: usize, policy: FanOutPolicy) -> Self {
        Self {
            limit: Arc::new(Semaphore::new(capacity.max(1))),
            tasks: JoinSet::new(),
            policy,
            tripped: Arc::new(AtomicBool::new(false)),
            failures: Vec::new(),
            stats: ThrottleStats::default(),
        }
    }

    pub fn stats(&self) -> ThrottleStats {
        self.stats
    }

    pub async fn run<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        self.stats.submitted += 1;
        self.reap_finished();

        if self.policy == FanOutPolicy::FailFast && self.tripped.load(Ordering::SeqCst) {
            self.stats.skipped += 1;
            return;
        }

        let permit = match Arc::clone(&self.limit).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // The semaphore is owned here and never closed.
                self.record(Err(SyncError::Other(anyhow::anyhow!("throttler closed"))));
                return;
            }
        };

        if self.policy == FanOutPolicy::FailFast && self.tripped.load(Ordering::SeqCst) {
            self.stats.skipped += 1;
            return;
        }

        let tripped = Arc::clone(&self.tripped);
        self.tasks.spawn(
            async move {
                let _permit = permit;
                let result = task.await;
                if result.is_err() {
                    tripped.store(true, Ordering::SeqCst);
                }
                result
            }
            .in_current_span(),
        );
    }

    /// Wait for every submitted task. `Ok` carries the number that succeeded.
    pub async fn wait(&mut self) -> Result<usize, AggregateError> {
        while let Some(joined) = self.tasks.join_next().await {
            self.record(flatten(joined));
        }
        let succeeded = self.stats.succeeded;
        if self.failures.is_empty() {
            Ok(succeeded)
        } else {
            Err(AggregateError::new(std::mem::take(&mut self.failures)))
        }
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.record(flatten(joined));
        }
    }

    fn record(&mut self, result: Result<(), SyncError>) {
        match result {
            Ok(()) => self.stats.succeeded += 1,
            Err(err) => {
                self.tripped.store(true, Ordering::SeqCst);
                self.stats.failed += 1;
                self.failures.push(err);
            }
        }
    }
}

fn flatten(joined: Result<Result<(), SyncError>, JoinError>) -> Result<(), SyncError> {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(SyncError::TaskPanicked(message))
        }
        Err(err) => Err(SyncError::TaskPanicked(err.to_string())),
    }
}
