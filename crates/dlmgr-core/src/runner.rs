//! Task Runner: orchestrates one Task end-to-end (probe, plan, fetch, merge).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::control::{CancelSignal, PauseGate};
use crate::downloader::{
    fetch_single_stream, run_segments, SegmentPoolContext, SingleStreamContext,
};
use crate::error::EngineError;
use crate::probe::{self, HeadResult};
use crate::retry::RetryPolicy;
use crate::safe_resume::validate_for_resume;
use crate::segmenter::{self, PlannerSettings, Segment, SegmentStatus};
use crate::storage::{cleanup_parts, merge_parts};
use crate::store::TaskStore;
use crate::task::TaskID;
use crate::task::TaskStatus;
use crate::url_model::{derive_filename, unique_final_path};

/// Runs Task `id` to completion (or failure/cancellation), mutating it in
/// the Task Store as it progresses. Intended to run inside `spawn_blocking`
/// from the async Scheduler loop.
pub fn run_task(store: &TaskStore, config: &Config, id: TaskID) {
    if let Err(e) = run_task_inner(store, config, id) {
        if !matches!(e, EngineError::Cancelled) {
            let _ = store.with_task(id, |t| {
                t.status = TaskStatus::Failed;
                t.error = Some((&e).into());
                t.finished_at = Some(crate::task::now_epoch());
            });
            tracing::warn!(task_id = %id, error = %e, "task failed");
        }
        store.unregister_control(id);
    }
}

fn run_task_inner(store: &TaskStore, config: &Config, id: TaskID) -> Result<(), EngineError> {
    let (pause_gate, cancel) = store.register_control(id);
    let counter = store.task_counter(id).unwrap_or_default();

    let retry_policy = RetryPolicy {
        max_attempts: config.retry_attempts.max(1),
        ..RetryPolicy::default()
    };

    store.transition(id, TaskStatus::Probing)?;
    let url = store.with_task(id, |t| t.url.clone())?;

    tracing::info!(task_id = %id, url = %url, "probing");
    let head = crate::retry::run_with_retry(&retry_policy, &cancel, || {
        probe::probe(&url, &HashMap::new(), Duration::from_secs(config.timeout_secs))
    })?;

    // Re-probing an already-planned (resumed) task: bail out loudly if the
    // remote resource changed so stale part files aren't silently reused.
    store.with_task(id, |t| validate_for_resume(t, &head))?.map_err(EngineError::from)?;

    let (filename, final_path) = store.with_task(id, |t| {
        if t.filename.is_empty() || t.final_path.as_os_str().is_empty() {
            let filename = derive_filename(&head.resolved_url, head.content_disposition.as_deref());
            let final_path = unique_final_path(&config.download_dir, &filename);
            t.filename = filename.clone();
            t.final_path = final_path.clone();
            (filename, final_path)
        } else {
            (t.filename.clone(), t.final_path.clone())
        }
    })?;
    if let Some(parent) = final_path.parent() {
        std::fs::create_dir_all(parent).map_err(EngineError::from)?;
    }

    store.with_task(id, |t| {
        t.resolved_url = Some(head.resolved_url.clone());
        t.total_size = head.content_length.unwrap_or(0);
        t.supports_range = head.accept_ranges;
        t.etag = head.etag.clone();
        t.last_modified = head.last_modified.clone();
    })?;

    store.transition(id, TaskStatus::Downloading)?;

    let plan = segmenter::plan(
        head.content_length.unwrap_or(0),
        head.accept_ranges,
        PlannerSettings {
            min_split_size: config.min_split_size,
            segment_count: config.segment_count,
        },
    );

    let segment_count = plan.as_ref().map(|s| s.len()).unwrap_or(0);
    if let Some(segments) = &plan {
        store.with_task(id, |t| t.segments = segments.clone())?;
    }

    let pacer = crate::pacer::Pacer::new(config.max_speed_limit * 1024);
    let result = match plan {
        Some(segments) => {
            let multi_result = run_multi_segment(
                config,
                &head,
                &final_path,
                Arc::clone(&pause_gate),
                Arc::clone(&cancel),
                Arc::clone(&pacer),
                Arc::clone(&counter),
                retry_policy,
                segments,
            );
            multi_result.and_then(|()| {
                merge_parts(&final_path, segment_count).map_err(|e| {
                    crate::retry::SegmentError::Storage(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e.to_string(),
                    ))
                })
            })
        }
        None => {
            let ctx = SingleStreamContext {
                url: &head.resolved_url,
                final_path: &final_path,
                user_agent: &config.user_agent,
                proxy: &config.proxy,
                timeout: Duration::from_secs(config.timeout_secs),
                pause_gate: Arc::clone(&pause_gate),
                cancel: Arc::clone(&cancel),
                pacer: Arc::clone(&pacer),
                task_downloaded: Arc::clone(&counter),
            };
            crate::retry::run_with_retry(&retry_policy, &cancel, || fetch_single_stream(&ctx)).and_then(|_| {
                std::fs::rename(crate::storage::tmp_path(&final_path), &final_path)
                    .map_err(crate::retry::SegmentError::Storage)
            })
        }
    };

    store.with_task(id, |t| t.downloaded_size = counter.load(Ordering::SeqCst))?;

    if cancel.is_raised() {
        cleanup_parts(&final_path, segment_count);
        let _ = std::fs::remove_file(crate::storage::tmp_path(&final_path));
        store.with_task(id, |t| mark_segments(&mut t.segments, SegmentStatus::Failed))?;
        store.transition(id, TaskStatus::Cancelled)?;
        store.unregister_control(id);
        return Err(EngineError::Cancelled);
    }

    match result {
        Ok(()) => {
            store.with_task(id, |t| mark_segments(&mut t.segments, SegmentStatus::Completed))?;
            store.transition(id, TaskStatus::Completed)?;
            store.unregister_control(id);
            tracing::info!(task_id = %id, filename = %filename, "completed");
            Ok(())
        }
        Err(e) => {
            store.with_task(id, |t| mark_segments(&mut t.segments, SegmentStatus::Failed))?;
            store.unregister_control(id);
            Err(map_segment_error(e))
        }
    }
}

fn mark_segments(segments: &mut [Segment], status: SegmentStatus) {
    for s in segments {
        s.status = status;
    }
}

#[allow(clippy::too_many_arguments)]
fn run_multi_segment(
    config: &Config,
    head: &HeadResult,
    final_path: &std::path::Path,
    pause_gate: Arc<PauseGate>,
    cancel: Arc<CancelSignal>,
    pacer: Arc<crate::pacer::Pacer>,
    counter: Arc<AtomicU64>,
    retry_policy: RetryPolicy,
    segments: Vec<Segment>,
) -> Result<(), crate::retry::SegmentError> {
    let pool_ctx = Arc::new(SegmentPoolContext {
        url: head.resolved_url.clone(),
        final_path: final_path.to_path_buf(),
        user_agent: config.user_agent.clone(),
        proxy: config.proxy.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
        chunk_size: config.segment_chunk_size,
        anti_throttle_pause: config.anti_throttle_pause,
        pause_gate,
        cancel,
        pacer,
        task_downloaded: counter,
        retry_policy,
    });
    run_segments(pool_ctx, segments)
}

fn map_segment_error(e: crate::retry::SegmentError) -> EngineError {
    use crate::retry::SegmentError::*;
    match e {
        Curl(ce) => EngineError::TransportError(ce.to_string()),
        Http(code) => EngineError::HttpError { status: code },
        PartialTransfer { expected, received } => {
            EngineError::TransportError(format!("partial transfer: {received}/{expected} bytes"))
        }
        Storage(io) => EngineError::from(io),
    }
}
