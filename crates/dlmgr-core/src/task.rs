//! The Task record: identity, attributes, state machine, and the read-only
//! snapshot handed to control-surface callers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::segmenter::Segment;

/// Opaque, process-local, monotonically-issued task identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskID(u64);

impl TaskID {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues unique, increasing TaskIDs for the life of the process.
#[derive(Default)]
pub struct TaskIdGenerator {
    next: u64,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> TaskID {
        let id = TaskID(self.next);
        self.next += 1;
        id
    }
}

/// Lifecycle state of a Task. See module docs on `Task` for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Probing,
    Downloading,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Status label used by `list_tasks`'s grouping keys. Failed tasks keep
    /// their own bucket; everything still moving is "active". Cancelled
    /// tasks have no bucket at all: they drop out of `list_tasks()` entirely
    /// rather than being folded into "failed", matching the reference
    /// manager's `get_all_downloads()`.
    pub fn bucket(self) -> Option<&'static str> {
        match self {
            TaskStatus::Queued => Some("queued"),
            TaskStatus::Probing | TaskStatus::Downloading => Some("active"),
            TaskStatus::Paused => Some("paused"),
            TaskStatus::Completed => Some("completed"),
            TaskStatus::Failed => Some("failed"),
            TaskStatus::Cancelled => None,
        }
    }
}

/// A failure recorded on a Task: the `EngineError` kind plus its message,
/// stored separately from the error type so a Task remains `Serialize`
/// without requiring `EngineError` to round-trip through JSON itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&crate::error::EngineError> for TaskErrorInfo {
    fn from(e: &crate::error::EngineError) -> Self {
        Self {
            kind: error_kind_label(e).to_string(),
            message: e.to_string(),
        }
    }
}

fn error_kind_label(e: &crate::error::EngineError) -> &'static str {
    use crate::error::EngineError::*;
    match e {
        InvalidUrl(_) => "invalid_url",
        ProbeFailed(_) => "probe_failed",
        RangeNotSupportedButRequired(_) => "range_not_supported",
        HttpError { .. } => "http_error",
        TransportError(_) => "transport_error",
        IoError(_) => "io_error",
        DiskFull => "disk_full",
        Cancelled => "cancelled",
        InvalidState { .. } => "invalid_state",
        NoSuchTask(_) => "no_such_task",
    }
}

/// A single download's full record, exclusively owned by the Task Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskID,
    pub url: String,
    pub resolved_url: Option<String>,
    pub filename: String,
    pub final_path: std::path::PathBuf,
    pub total_size: u64,
    pub downloaded_size: u64,
    pub status: TaskStatus,
    pub error: Option<TaskErrorInfo>,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    pub supports_range: bool,
    pub segments: Vec<Segment>,
    /// `ETag` from the probe that planned the current segments, kept so a
    /// resumed Task can detect that the remote resource changed underneath it.
    pub etag: Option<String>,
    /// `Last-Modified` from the same probe, same purpose as `etag`.
    pub last_modified: Option<String>,
}

impl Task {
    pub fn new(id: TaskID, url: String, final_path: std::path::PathBuf, filename: String) -> Self {
        Self {
            id,
            url,
            resolved_url: None,
            filename,
            final_path,
            total_size: 0,
            downloaded_size: 0,
            status: TaskStatus::Queued,
            error: None,
            created_at: now_epoch(),
            started_at: None,
            finished_at: None,
            supports_range: false,
            segments: Vec::new(),
            etag: None,
            last_modified: None,
        }
    }

    pub fn snapshot(&self, speed_bytes_per_sec: f64) -> TaskSnapshot {
        let progress = if self.total_size > 0 {
            ((self.downloaded_size as f64 / self.total_size as f64) * 100.0).min(100.0)
        } else {
            0.0
        };
        let eta = if speed_bytes_per_sec > 0.0 && self.total_size > self.downloaded_size {
            Some(((self.total_size - self.downloaded_size) as f64 / speed_bytes_per_sec) as u64)
        } else {
            None
        };
        TaskSnapshot {
            id: self.id,
            url: self.url.clone(),
            filename: self.filename.clone(),
            filepath: self.final_path.clone(),
            total_size: self.total_size,
            downloaded_size: self.downloaded_size,
            status: self.status,
            speed: speed_bytes_per_sec,
            progress,
            error: self.error.clone(),
            eta,
        }
    }
}

/// Read-only view of a Task handed to control-surface callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskID,
    pub url: String,
    pub filename: String,
    pub filepath: std::path::PathBuf,
    pub total_size: u64,
    pub downloaded_size: u64,
    pub status: TaskStatus,
    pub speed: f64,
    pub progress: f64,
    pub error: Option<TaskErrorInfo>,
    pub eta: Option<u64>,
}

pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_generator_is_monotonic() {
        let mut gen = TaskIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert!(b.get() > a.get());
    }

    #[test]
    fn status_buckets_group_probing_and_downloading_as_active() {
        assert_eq!(TaskStatus::Probing.bucket(), Some("active"));
        assert_eq!(TaskStatus::Downloading.bucket(), Some("active"));
        assert_eq!(TaskStatus::Cancelled.bucket(), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Paused.is_terminal());
    }

    #[test]
    fn snapshot_progress_and_eta() {
        let mut t = Task::new(
            TaskID::new(1),
            "https://example.com/f".into(),
            "/tmp/f".into(),
            "f".into(),
        );
        t.total_size = 1000;
        t.downloaded_size = 250;
        let s = t.snapshot(100.0);
        assert_eq!(s.progress, 25.0);
        assert_eq!(s.eta, Some(7));
    }

    #[test]
    fn snapshot_no_eta_when_speed_is_zero() {
        let mut t = Task::new(
            TaskID::new(1),
            "https://example.com/f".into(),
            "/tmp/f".into(),
            "f".into(),
        );
        t.total_size = 1000;
        t.downloaded_size = 250;
        let s = t.snapshot(0.0);
        assert_eq!(s.eta, None);
    }
}
