//! Per-task synchronization: the pause gate and cancel signal.
//!
//! Segment Fetchers run on blocking threads, so both primitives are plain
//! `std::sync` types rather than async ones: a fetcher checks them once per
//! read buffer without needing a runtime handle.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::task::TaskID;

/// Error returned when a Segment Fetcher stops because the task was cancelled.
#[derive(Debug)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// A two-state condition: open (running) or closed (paused). `wait_if_paused`
/// blocks the calling thread while closed and returns immediately once open.
pub struct PauseGate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl PauseGate {
    fn new() -> Self {
        Self {
            open: Mutex::new(true),
            cv: Condvar::new(),
        }
    }

    /// Close the gate; subsequent `wait_if_paused` calls block until `resume`.
    pub fn pause(&self) {
        *self.open.lock().unwrap() = false;
    }

    /// Open the gate and wake any threads blocked in `wait_if_paused`.
    pub fn resume(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }

    /// Blocks the calling thread while the gate is closed. Returns immediately
    /// if already open. Call once per read buffer, never while holding other locks.
    pub fn wait_if_paused(&self) {
        let guard = self.open.lock().unwrap();
        let _unused = self.cv.wait_while(guard, |open| !*open).unwrap();
    }
}

/// Monotonic cancel flag: once raised, stays raised for the life of the task.
#[derive(Default)]
pub struct CancelSignal(AtomicBool);

impl CancelSignal {
    fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The pair of primitives a Task Runner and all its Segment Fetchers share.
pub struct TaskControl {
    pub pause_gate: Arc<PauseGate>,
    pub cancel: Arc<CancelSignal>,
}

impl TaskControl {
    fn new() -> Self {
        Self {
            pause_gate: Arc::new(PauseGate::new()),
            cancel: Arc::new(CancelSignal::new()),
        }
    }
}

/// Registry of TaskControl by TaskID, owned by the Task Store. Engine API
/// calls (`pause`, `resume`, `cancel`) look up the control here; Task Runners
/// register/unregister as they start and finish.
#[derive(Default)]
pub struct ControlRegistry {
    tasks: RwLock<HashMap<TaskID, TaskControl>>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task's control primitives. Returns clones of both handles
    /// for the Task Runner to pass down to its Segment Fetchers.
    pub fn register(&self, id: TaskID) -> (Arc<PauseGate>, Arc<CancelSignal>) {
        let control = TaskControl::new();
        let handles = (Arc::clone(&control.pause_gate), Arc::clone(&control.cancel));
        self.tasks.write().unwrap().insert(id, control);
        handles
    }

    pub fn unregister(&self, id: TaskID) {
        self.tasks.write().unwrap().remove(&id);
    }

    /// Idempotent: closes the pause gate if the task is currently registered.
    pub fn pause(&self, id: TaskID) {
        if let Some(c) = self.tasks.read().unwrap().get(&id) {
            c.pause_gate.pause();
        }
    }

    /// Idempotent: opens the pause gate if the task is currently registered.
    pub fn resume(&self, id: TaskID) {
        if let Some(c) = self.tasks.read().unwrap().get(&id) {
            c.pause_gate.resume();
        }
    }

    /// Idempotent: raises the cancel signal if the task is currently registered.
    /// No-op for a task that is not running (the Scheduler handles removing a
    /// Queued task from the ready-queue directly).
    pub fn cancel(&self, id: TaskID) {
        if let Some(c) = self.tasks.read().unwrap().get(&id) {
            c.cancel.raise();
            // A cancelled task must not stay paused forever waiting on the gate.
            c.pause_gate.resume();
        }
    }

    pub fn is_registered(&self, id: TaskID) -> bool {
        self.tasks.read().unwrap().contains_key(&id)
    }
}
