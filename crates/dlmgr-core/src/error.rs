//! Engine-level error kinds surfaced on a `Task`.
//!
//! Segment-level transport errors (`SegmentError`, in `retry`) and resume
//! validation errors (`ValidationError`, in `safe_resume`) are narrower types
//! that eventually get folded into one of these when they reach the Task
//! Runner.

use thiserror::Error;

/// Error surfaced on a Task's `error` field, or returned directly by engine
/// API calls that reject an invalid request.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("probe failed: {0}")]
    ProbeFailed(String),

    #[error("resume is not possible because the remote resource changed: {0}")]
    RangeNotSupportedButRequired(String),

    #[error("HTTP error: status {status}")]
    HttpError { status: u32 },

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("disk full")]
    DiskFull,

    #[error("cancelled")]
    Cancelled,

    #[error("invalid state transition: task is {current}, requested action requires {expected}")]
    InvalidState { current: String, expected: String },

    #[error("no such task: {0}")]
    NoSuchTask(u64),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::OutOfMemory || e.raw_os_error() == Some(28) {
            EngineError::DiskFull
        } else {
            EngineError::IoError(e.to_string())
        }
    }
}

impl From<crate::safe_resume::ValidationError> for EngineError {
    fn from(e: crate::safe_resume::ValidationError) -> Self {
        EngineError::RangeNotSupportedButRequired(e.to_string())
    }
}

impl crate::retry::RetryableError for EngineError {
    fn retry_kind(&self) -> crate::retry::ErrorKind {
        use crate::retry::ErrorKind;
        match self {
            EngineError::HttpError { status } => crate::retry::classify_http_status(*status),
            EngineError::TransportError(_) => ErrorKind::Connection,
            EngineError::InvalidUrl(_)
            | EngineError::ProbeFailed(_)
            | EngineError::RangeNotSupportedButRequired(_)
            | EngineError::IoError(_)
            | EngineError::DiskFull
            | EngineError::Cancelled
            | EngineError::InvalidState { .. }
            | EngineError::NoSuchTask(_) => ErrorKind::Other,
        }
    }

    fn cancelled() -> Self {
        EngineError::Cancelled
    }
}
