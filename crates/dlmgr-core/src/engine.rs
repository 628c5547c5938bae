//! Embedded engine API: the surface a CLI or any other host embeds against.
//!
//! `Engine` owns the `TaskStore`, the `Config`, and the Scheduler's lifecycle.
//! All task mutation goes through the Task Store; this module only adds URL
//! validation, ready-queue admission, and persistence bootstrap/shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::EngineError;
use crate::persistence;
use crate::scheduler::{self, ReadyQueue};
use crate::store::TaskStore;
use crate::task::{TaskID, TaskSnapshot, TaskStatus};

/// Handle to a running (or not-yet-started) engine instance.
pub struct Engine {
    store: Arc<TaskStore>,
    config: Arc<Config>,
    queue: Arc<ReadyQueue>,
    scheduler: tokio::sync::Mutex<Option<SchedulerHandle>>,
    state_path: Option<std::path::PathBuf>,
}

struct SchedulerHandle {
    stop_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl Engine {
    /// Builds a fresh engine against the real XDG state file. Reinstates any
    /// persisted tasks from the last run if `config.resume_on_startup` is set.
    pub fn new(config: Config) -> Self {
        Self::with_state_path(config, persistence::state_path().ok())
    }

    /// Builds an engine that persists to `state_path` instead of the real
    /// XDG state file. Exposed so embedders (and this crate's own tests)
    /// can redirect persistence without touching `~/.local/state/dlmgr`.
    pub fn with_state_path(config: Config, state_path: Option<std::path::PathBuf>) -> Self {
        let store = Arc::new(TaskStore::new());
        if config.resume_on_startup {
            if let Some(path) = &state_path {
                match persistence::load_snapshot(path) {
                    Ok(tasks) if !tasks.is_empty() => {
                        tracing::info!(count = tasks.len(), "reinstating persisted tasks");
                        store.reinstate(tasks);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "failed to load persisted state"),
                }
            }
        }
        Self {
            store,
            config: Arc::new(config),
            queue: Arc::new(ReadyQueue::new()),
            scheduler: tokio::sync::Mutex::new(None),
            state_path,
        }
    }

    /// Starts the Scheduler loop. Idempotent: a second call while already
    /// running is a no-op.
    pub async fn start(&self) {
        let mut guard = self.scheduler.lock().await;
        if guard.is_some() {
            return;
        }
        for id in self.store.ids_with_status(TaskStatus::Queued) {
            self.queue.push(id).await;
        }
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let store = Arc::clone(&self.store);
        let config = Arc::clone(&self.config);
        let queue = Arc::clone(&self.queue);
        let state_path = self.state_path.clone();
        let join = tokio::spawn(scheduler::run(store, config, queue, state_path, stop_rx));
        *guard = Some(SchedulerHandle { stop_tx, join });
    }

    /// Stops the Scheduler loop, waiting for in-flight Task Runners to
    /// finish. Idempotent: a second call while already stopped is a no-op.
    pub async fn stop(&self) {
        let handle = self.scheduler.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.stop_tx.send(()).await;
            let _ = handle.join.await;
        }
        self.persist();
    }

    /// Validates, registers, and (if auto-start is on) queues a new download.
    ///
    /// `filename`/`final_path` are left empty here; the Task Runner derives
    /// them after probing so Content-Disposition and the post-redirect URL
    /// get a say (see SPEC_FULL §4.2 step 2) instead of freezing a filename
    /// guessed from the pre-probe URL.
    pub async fn add_task(&self, url: &str) -> Result<TaskID, EngineError> {
        validate_url(url)?;
        let id = self
            .store
            .insert_new(url.to_string(), std::path::PathBuf::new(), String::new());
        if self.config.auto_start {
            self.queue.push(id).await;
        }
        self.persist();
        Ok(id)
    }

    pub async fn add_tasks(&self, urls: &[String]) -> Vec<Result<TaskID, EngineError>> {
        let mut out = Vec::with_capacity(urls.len());
        for url in urls {
            out.push(self.add_task(url).await);
        }
        out
    }

    pub fn get_task(&self, id: TaskID) -> Option<TaskSnapshot> {
        self.store.get_snapshot(id)
    }

    pub fn list_tasks(&self) -> HashMap<&'static str, Vec<TaskSnapshot>> {
        self.store.list_snapshots()
    }

    pub fn pause(&self, id: TaskID) -> Result<(), EngineError> {
        self.store.pause(id)?;
        self.persist();
        Ok(())
    }

    pub fn resume(&self, id: TaskID) -> Result<(), EngineError> {
        self.store.resume(id)?;
        self.persist();
        Ok(())
    }

    /// Cancels a task. If it hasn't started running yet, also removes it
    /// from the ready-queue so the Scheduler never dispatches it.
    pub async fn cancel(&self, id: TaskID) -> Result<(), EngineError> {
        self.store.cancel(id)?;
        self.queue.remove(id).await;
        self.persist();
        Ok(())
    }

    /// Resets a Failed task to Queued and re-admits it to the ready-queue.
    pub async fn retry(&self, id: TaskID) -> Result<(), EngineError> {
        self.store.retry(id)?;
        self.queue.push(id).await;
        self.persist();
        Ok(())
    }

    /// Resets every Failed task to Queued and re-admits them all.
    pub async fn retry_failed(&self) {
        for id in self.store.retry_failed() {
            self.queue.push(id).await;
        }
        self.persist();
    }

    pub fn clear_completed(&self) {
        self.store.clear_completed();
        self.persist();
    }

    /// Writes the current non-completed tasks to the state file. Called
    /// after every mutation so a fresh `Engine` in the next CLI invocation
    /// picks up where this one left off; the Scheduler also calls this on
    /// its own heartbeat while a download is in flight.
    fn persist(&self) {
        let Some(path) = &self.state_path else { return };
        if let Err(e) = persistence::save_snapshot(path, self.store.persistable_tasks()) {
            tracing::warn!(error = %e, "failed to persist task snapshot");
        }
    }
}

fn validate_url(url: &str) -> Result<(), EngineError> {
    let parsed = url::Url::parse(url).map_err(|e| EngineError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(EngineError::InvalidUrl(format!("unsupported scheme: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine(dir: &std::path::Path, config: Config) -> Engine {
        Engine::with_state_path(config, Some(dir.join("state.json")))
    }

    #[tokio::test]
    async fn add_task_rejects_non_http_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(dir.path(), Config { resume_on_startup: false, ..Config::default() });
        let err = engine.add_task("ftp://example.com/f").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn add_task_registers_queued_task() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(dir.path(), Config {
            resume_on_startup: false,
            auto_start: false,
            download_dir: dir.path().to_path_buf(),
            ..Config::default()
        });
        let id = engine.add_task("https://example.com/file.zip").await.unwrap();
        let snap = engine.get_task(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn cancel_unqueues_a_pending_task() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(dir.path(), Config {
            resume_on_startup: false,
            auto_start: true,
            download_dir: dir.path().to_path_buf(),
            ..Config::default()
        });
        let id = engine.add_task("https://example.com/file.zip").await.unwrap();
        engine.cancel(id).await.unwrap();
        let snap = engine.get_task(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn start_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = test_engine(dir.path(), Config { resume_on_startup: false, auto_start: false, ..Config::default() });
        engine.start().await;
        engine.start().await;
        engine.stop().await;
        engine.stop().await;
    }

    #[tokio::test]
    async fn persisted_tasks_are_reinstated_across_engines() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let engine = Engine::with_state_path(
            Config { resume_on_startup: false, auto_start: false, download_dir: dir.path().to_path_buf(), ..Config::default() },
            Some(state_path.clone()),
        );
        let id = engine.add_task("https://example.com/file.zip").await.unwrap();

        let reloaded = Engine::with_state_path(
            Config { resume_on_startup: true, auto_start: false, download_dir: dir.path().to_path_buf(), ..Config::default() },
            Some(state_path),
        );
        let snap = reloaded.get_task(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Queued);
    }
}
