//! Dispatches one OS thread per segment and collects their outcomes.
//!
//! Each Task Runner occupies one Scheduler slot; within that slot its
//! Segment Fetchers each get their own blocking thread rather than sharing a
//! pool, since `segment_count` is already bounded (typically ≤ 16) and the
//! Scheduler is what caps how many Tasks run at once.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use crate::control::{CancelSignal, PauseGate};
use crate::pacer::Pacer;
use crate::retry::{run_with_retry, RetryPolicy, SegmentError};
use crate::segmenter::Segment;

use super::segment::{fetch_segment, FetchContext};

/// Shared, thread-safe inputs for every Segment Fetcher of one Task.
pub struct SegmentPoolContext {
    pub url: String,
    pub final_path: std::path::PathBuf,
    pub user_agent: String,
    pub proxy: String,
    pub timeout: Duration,
    pub chunk_size: usize,
    pub anti_throttle_pause: bool,
    pub pause_gate: Arc<PauseGate>,
    pub cancel: Arc<CancelSignal>,
    pub pacer: Arc<Pacer>,
    pub task_downloaded: Arc<AtomicU64>,
    pub retry_policy: RetryPolicy,
}

/// Runs every segment on its own thread, retrying per-segment failures
/// according to `retry_policy`. Returns `Ok(())` only if every segment
/// completed; otherwise the first segment error encountered.
pub fn run_segments(ctx: Arc<SegmentPoolContext>, segments: Vec<Segment>) -> Result<(), SegmentError> {
    let handles: Vec<_> = segments
        .into_iter()
        .map(|segment| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || -> Result<(), SegmentError> {
                run_with_retry(&ctx.retry_policy, &ctx.cancel, || {
                    let fetch_ctx = FetchContext {
                        url: &ctx.url,
                        final_path: &ctx.final_path,
                        user_agent: &ctx.user_agent,
                        proxy: &ctx.proxy,
                        timeout: ctx.timeout,
                        chunk_size: ctx.chunk_size,
                        anti_throttle_pause: ctx.anti_throttle_pause,
                        pause_gate: Arc::clone(&ctx.pause_gate),
                        cancel: Arc::clone(&ctx.cancel),
                        pacer: Arc::clone(&ctx.pacer),
                        task_downloaded: Arc::clone(&ctx.task_downloaded),
                    };
                    fetch_segment(&fetch_ctx, &segment).map(|_| ())
                })
            })
        })
        .collect();

    let mut first_err = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
            Err(_) => {
                if first_err.is_none() {
                    first_err = Some(SegmentError::Storage(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "segment fetcher thread panicked",
                    )));
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
