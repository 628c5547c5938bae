//! Scheduler: bounded worker pool over Task Runner invocations.
//!
//! The loop itself is async so it can interleave dispatching Task Runners
//! (synchronous, curl-based, run via `spawn_blocking`) with the low-frequency
//! persistence heartbeat. Concurrency is capped with a `tokio::sync::Semaphore`
//! sized to `max_concurrent_downloads`; a FIFO ready-queue feeds it TaskIDs.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinSet;

use crate::config::Config;
use crate::persistence;
use crate::runner;
use crate::store::TaskStore;
use crate::task::TaskID;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// FIFO queue of TaskIDs waiting for a scheduler slot.
#[derive(Default)]
pub struct ReadyQueue {
    inner: AsyncMutex<VecDeque<TaskID>>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, id: TaskID) {
        self.inner.lock().await.push_back(id);
    }

    async fn pop(&self) -> Option<TaskID> {
        self.inner.lock().await.pop_front()
    }

    /// Removes `id` if it is still waiting (hasn't been dispatched yet).
    pub async fn remove(&self, id: TaskID) {
        self.inner.lock().await.retain(|&x| x != id);
    }
}

/// Drives the ready-queue against a bounded pool of blocking worker slots.
/// `stop_rx` ends the loop once a value is received (idempotent `stop()`).
pub async fn run(
    store: Arc<TaskStore>,
    config: Arc<Config>,
    queue: Arc<ReadyQueue>,
    state_path: Option<PathBuf>,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1)));
    let mut runners: JoinSet<()> = JoinSet::new();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = heartbeat.tick() => {
                persist_if_downloading(&store, state_path.as_deref());
            }
            Some(id) = queue.pop() => {
                let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore not closed");
                let store = Arc::clone(&store);
                let config = Arc::clone(&config);
                runners.spawn_blocking(move || {
                    runner::run_task(&store, &config, id);
                    drop(permit);
                });
            }
            Some(_finished) = runners.join_next(), if !runners.is_empty() => {
                persist_if_terminal(&store, state_path.as_deref());
            }
        }
    }

    while runners.join_next().await.is_some() {}
}

fn persist_if_downloading(store: &TaskStore, state_path: Option<&std::path::Path>) {
    let tasks = store.persistable_tasks();
    let any_downloading = tasks
        .iter()
        .any(|t| t.status == crate::task::TaskStatus::Downloading);
    if any_downloading {
        write_snapshot(tasks, state_path);
    }
}

fn persist_if_terminal(store: &TaskStore, state_path: Option<&std::path::Path>) {
    write_snapshot(store.persistable_tasks(), state_path);
}

fn write_snapshot(tasks: Vec<crate::task::Task>, state_path: Option<&std::path::Path>) {
    let Some(path) = state_path else {
        tracing::warn!("no usable state path; skipping persistence heartbeat");
        return;
    };
    if let Err(e) = persistence::save_snapshot(path, tasks) {
        tracing::warn!(error = %e, "failed to persist task snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_queue_fifo_order() {
        let q = ReadyQueue::new();
        q.push(TaskID::new(1)).await;
        q.push(TaskID::new(2)).await;
        assert_eq!(q.pop().await, Some(TaskID::new(1)));
        assert_eq!(q.pop().await, Some(TaskID::new(2)));
        assert_eq!(q.pop().await, None);
    }

    #[tokio::test]
    async fn ready_queue_remove_drops_queued_entry() {
        let q = ReadyQueue::new();
        q.push(TaskID::new(1)).await;
        q.push(TaskID::new(2)).await;
        q.remove(TaskID::new(1)).await;
        assert_eq!(q.pop().await, Some(TaskID::new(2)));
    }
}
