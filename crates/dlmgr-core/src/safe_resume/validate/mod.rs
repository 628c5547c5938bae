//! Compares a Task's stored metadata with a fresh probe result for safe resume.

mod error;

use crate::probe::HeadResult;
use crate::task::Task;

pub use error::{ValidationError, ValidationErrorKind};

/// Returns Ok(()) if `task` can be safely resumed against a fresh `head` probe.
///
/// If the task has no stored metadata (never probed), returns Ok(()) so the
/// caller can proceed with initial probe and segment planning. Otherwise
/// compares ETag, Last-Modified, and size; returns Err(ValidationError) if any
/// differ, meaning the remote resource changed and existing part files are
/// no longer trustworthy.
pub fn validate_for_resume(task: &Task, head: &HeadResult) -> Result<(), ValidationError> {
    let has_stored = task.total_size > 0 || task.etag.is_some() || task.last_modified.is_some();

    if !has_stored {
        return Ok(());
    }

    let etag_changed = match (&task.etag, &head.etag) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        _ => true,
    };

    let last_modified_changed = match (&task.last_modified, &head.last_modified) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        _ => true,
    };

    let stored_size = if task.total_size > 0 { Some(task.total_size) } else { None };
    let size_changed = match (stored_size, head.content_length) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        _ => true,
    };

    if etag_changed || last_modified_changed || size_changed {
        return Err(ValidationError {
            kind: ValidationErrorKind::RemoteChanged {
                etag_changed,
                last_modified_changed,
                size_changed,
            },
        });
    }

    Ok(())
}
