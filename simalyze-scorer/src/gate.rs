//! Bounded concurrency gate
//!
//! Admits at most `limit` tasks at once and queues the rest in arrival order
//! (tokio's semaphore is fair). Two gates are used: one around every remote
//! fetch and one around each whole-item analysis.
//!
//! The strategy is chosen once, at construction. A limit the semaphore cannot
//! represent degrades to the pass-through strategy with a warning instead of
//! refusing to run.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Admission control for async tasks
#[derive(Debug, Clone)]
pub enum ConcurrencyGate {
    /// At most `limit` tasks run concurrently
    Bounded {
        permits: Arc<Semaphore>,
        limit: usize,
    },
    /// Every task runs immediately
    Unbounded,
}

impl ConcurrencyGate {
    /// Gate admitting `limit` concurrent tasks
    ///
    /// Falls back to [`ConcurrencyGate::Unbounded`] when `limit` is zero or
    /// exceeds what the semaphore supports.
    pub fn bounded(limit: usize) -> Self {
        if limit == 0 || limit > Semaphore::MAX_PERMITS {
            warn!(
                limit,
                "Concurrency limit not representable, running without a gate"
            );
            return ConcurrencyGate::Unbounded;
        }

        ConcurrencyGate::Bounded {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn unbounded() -> Self {
        ConcurrencyGate::Unbounded
    }

    /// Configured limit, `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            ConcurrencyGate::Bounded { limit, .. } => Some(*limit),
            ConcurrencyGate::Unbounded => None,
        }
    }

    /// Free slots right now, `None` when unbounded
    pub fn available(&self) -> Option<usize> {
        match self {
            ConcurrencyGate::Bounded { permits, .. } => Some(permits.available_permits()),
            ConcurrencyGate::Unbounded => None,
        }
    }

    /// Run `task` once a slot is free and return its output
    ///
    /// The task's own result (including any `Err`) is handed back untouched;
    /// the gate never fails on behalf of a task, and one task's failure has
    /// no effect on queued siblings.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        match self {
            ConcurrencyGate::Bounded { permits, .. } => {
                let _permit = match permits.acquire().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        warn!("Concurrency gate closed, running task unbounded");
                        None
                    }
                };
                task.await
            }
            ConcurrencyGate::Unbounded => task.await,
        }
    }
}
