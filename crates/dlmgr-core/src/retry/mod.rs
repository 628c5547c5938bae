//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, throttling,
//! connection failures) and exponential backoff decisions so that higher
//! layers (scheduler, downloader) can share a consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::SegmentError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryableError};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::control::CancelSignal;
    use std::cell::Cell;
    use std::time::Duration;

    #[test]
    fn run_with_retry_succeeds_after_transient_failures() {
        let attempts = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let cancel = CancelSignal::default();
        let result = run_with_retry(&policy, &cancel, || {
            let n = attempts.get() + 1;
            attempts.set(n);
            if n < 3 {
                Err(SegmentError::Http(503))
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn run_with_retry_gives_up_on_non_retryable_error() {
        let policy = RetryPolicy::default();
        let cancel = CancelSignal::default();
        let result = run_with_retry(&policy, &cancel, || Err(SegmentError::Http(404)));
        assert!(matches!(result, Err(SegmentError::Http(404))));
    }
}
