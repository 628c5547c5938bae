//! Task Store: the process-wide TaskID -> Task map, plus the ControlRegistry
//! it owns for pause/cancel coordination.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::control::{CancelSignal, ControlRegistry, PauseGate};
use crate::error::EngineError;
use crate::task::{now_epoch, Task, TaskID, TaskIdGenerator, TaskSnapshot, TaskStatus};

/// Owns every Task known to the process and the synchronization primitives
/// Task Runners and the engine API share to pause/resume/cancel them.
pub struct TaskStore {
    tasks: Mutex<HashMap<TaskID, Task>>,
    ids: Mutex<TaskIdGenerator>,
    control: ControlRegistry,
    /// Per-task running byte counter, kept outside the `Task` struct so
    /// Segment Fetchers can increment it with a plain atomic add instead of
    /// taking the tasks lock on every buffer.
    counters: Mutex<HashMap<TaskID, Arc<AtomicU64>>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            ids: Mutex::new(TaskIdGenerator::new()),
            control: ControlRegistry::new(),
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert_new(&self, url: String, final_path: std::path::PathBuf, filename: String) -> TaskID {
        let id = self.ids.lock().unwrap().next();
        let task = Task::new(id, url, final_path, filename);
        self.tasks.lock().unwrap().insert(id, task);
        id
    }

    pub fn get_snapshot(&self, id: TaskID) -> Option<TaskSnapshot> {
        let tasks = self.tasks.lock().unwrap();
        let task = tasks.get(&id)?;
        Some(task.snapshot(0.0))
    }

    /// Always contains exactly the keys `active, queued, paused, completed,
    /// failed`, each present (possibly empty) regardless of which statuses
    /// currently have tasks. Cancelled tasks appear in none of them.
    pub fn list_snapshots(&self) -> HashMap<&'static str, Vec<TaskSnapshot>> {
        let tasks = self.tasks.lock().unwrap();
        let mut out: HashMap<&'static str, Vec<TaskSnapshot>> = HashMap::new();
        for bucket in ["active", "queued", "paused", "completed", "failed"] {
            out.insert(bucket, Vec::new());
        }
        for task in tasks.values() {
            if let Some(bucket) = task.status.bucket() {
                out.entry(bucket).or_default().push(task.snapshot(0.0));
            }
        }
        out
    }

    pub fn with_task<R>(&self, id: TaskID, f: impl FnOnce(&mut Task) -> R) -> Result<R, EngineError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(&id).ok_or(EngineError::NoSuchTask(id.get()))?;
        Ok(f(task))
    }

    pub fn remove(&self, id: TaskID) {
        self.tasks.lock().unwrap().remove(&id);
        self.counters.lock().unwrap().remove(&id);
    }

    pub fn clear_completed(&self) {
        self.tasks
            .lock()
            .unwrap()
            .retain(|_, t| t.status != TaskStatus::Completed);
    }

    /// Queues every Failed task by resetting it to `Queued` and clearing its error.
    pub fn retry_failed(&self) -> Vec<TaskID> {
        let mut tasks = self.tasks.lock().unwrap();
        let mut ids = Vec::new();
        for task in tasks.values_mut() {
            if task.status == TaskStatus::Failed {
                task.status = TaskStatus::Queued;
                task.error = None;
                ids.push(task.id);
            }
        }
        ids
    }

    pub fn transition(&self, id: TaskID, to: TaskStatus) -> Result<(), EngineError> {
        self.with_task(id, |t| {
            if t.status.is_terminal() {
                return Err(EngineError::InvalidState {
                    current: format!("{:?}", t.status),
                    expected: format!("{to:?}"),
                });
            }
            t.status = to;
            match to {
                TaskStatus::Probing if t.started_at.is_none() => t.started_at = Some(now_epoch()),
                TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled => {
                    t.finished_at = Some(now_epoch())
                }
                _ => {}
            }
            Ok(())
        })?
    }

    pub fn register_control(&self, id: TaskID) -> (Arc<PauseGate>, Arc<CancelSignal>) {
        let counter = Arc::new(AtomicU64::new(0));
        self.counters.lock().unwrap().insert(id, counter);
        self.control.register(id)
    }

    pub fn unregister_control(&self, id: TaskID) {
        self.control.unregister(id);
        self.counters.lock().unwrap().remove(&id);
    }

    pub fn task_counter(&self, id: TaskID) -> Option<Arc<AtomicU64>> {
        self.counters.lock().unwrap().get(&id).cloned()
    }

    /// Idempotent: no-op if `id` isn't registered or isn't `Downloading`.
    pub fn pause(&self, id: TaskID) -> Result<(), EngineError> {
        self.with_task(id, |t| {
            if t.status == TaskStatus::Downloading {
                t.status = TaskStatus::Paused;
            }
        })?;
        self.control.pause(id);
        Ok(())
    }

    pub fn resume(&self, id: TaskID) -> Result<(), EngineError> {
        self.with_task(id, |t| {
            if t.status == TaskStatus::Paused {
                t.status = TaskStatus::Downloading;
            }
        })?;
        self.control.resume(id);
        Ok(())
    }

    pub fn cancel(&self, id: TaskID) -> Result<(), EngineError> {
        self.with_task(id, |t| {
            if !t.status.is_terminal() {
                t.status = TaskStatus::Cancelled;
                t.finished_at = Some(now_epoch());
            }
        })?;
        self.control.cancel(id);
        Ok(())
    }

    pub fn retry(&self, id: TaskID) -> Result<(), EngineError> {
        self.with_task(id, |t| {
            if t.status != TaskStatus::Failed {
                return Err(EngineError::InvalidState {
                    current: format!("{:?}", t.status),
                    expected: "Failed".to_string(),
                });
            }
            t.status = TaskStatus::Queued;
            t.error = None;
            Ok(())
        })?
    }

    pub fn ids_with_status(&self, status: TaskStatus) -> Vec<TaskID> {
        self.tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.status == status)
            .map(|t| t.id)
            .collect()
    }

    /// Snapshot of every non-Completed task, for persistence.
    pub fn persistable_tasks(&self) -> Vec<Task> {
        self.tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.status != TaskStatus::Completed)
            .cloned()
            .collect()
    }

    /// Reinstates tasks loaded from a state file, normalizing any
    /// `Downloading` status to `Queued` per the crash-recovery rule.
    pub fn reinstate(&self, mut tasks: Vec<Task>) {
        let mut next_id = 1u64;
        for task in &mut tasks {
            if task.status == TaskStatus::Downloading || task.status == TaskStatus::Probing {
                task.status = TaskStatus::Queued;
            }
            next_id = next_id.max(task.id.get() + 1);
        }
        let mut map = self.tasks.lock().unwrap();
        for task in tasks {
            map.insert(task.id, task);
        }
        drop(map);
        let mut ids = self.ids.lock().unwrap();
        *ids = TaskIdGenerator::new();
        for _ in 1..next_id {
            ids.next();
        }
    }
}
