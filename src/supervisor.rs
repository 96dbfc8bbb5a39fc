//! Task supervisor for the session's concurrent flows.
//!
//! Every background task (sampler loop, inbox watcher, console, homework
//! jobs, playback, Pkaisetu handling) is spawned through [`TaskSupervisor`],
//! which tracks it for shutdown and keeps a live count per [`TaskKind`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Sampler,
    Ingest,
    Console,
    Homework,
    Teaching,
    Interrupt,
}

type Counts = Arc<Mutex<HashMap<TaskKind, usize>>>;

/// Decrements its kind's count when the task ends, including by panic or
/// abort.
struct CountGuard {
    counts: Counts,
    kind: TaskKind,
}

impl Drop for CountGuard {
    fn drop(&mut self) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(n) = counts.get_mut(&self.kind) {
            *n = n.saturating_sub(1);
        }
    }
}

#[derive(Clone, Default)]
pub struct TaskSupervisor {
    tracker: TaskTracker,
    shutdown: CancellationToken,
    counts: Counts,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        {
            let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
            *counts.entry(kind).or_insert(0) += 1;
        }
        let guard = CountGuard {
            counts: Arc::clone(&self.counts),
            kind,
        };
        self.tracker.spawn(async move {
            let _guard = guard;
            future.await;
        });
    }

    /// Tasks of `kind` that have not finished yet.
    pub fn in_flight(&self, kind: TaskKind) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    /// Cancelled when shutdown begins; long-running loops select on it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop accepting work, signal the loops and wait up to `grace` for every
    /// task.  Returns `false` if tasks were still running when the grace
    /// period ran out.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.shutdown.cancel();
        self.tracker.close();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                log::info!("supervisor: all tasks finished");
                true
            }
            Err(_) => {
                log::warn!(
                    "supervisor: {} task(s) still running after {:?}",
                    self.tracker.len(),
                    grace
                );
                false
            }
        }
    }
}
