//! Single-stream fallback: one fetcher streaming directly into `<final_path>.tmp`.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::control::{CancelSignal, PauseGate};
use crate::pacer::Pacer;
use crate::retry::SegmentError;

/// Parameters for a non-segmented download (no range support, or the
/// planner decided the file is too small to split).
pub struct SingleStreamContext<'a> {
    pub url: &'a str,
    pub final_path: &'a std::path::Path,
    pub user_agent: &'a str,
    pub proxy: &'a str,
    pub timeout: Duration,
    pub pause_gate: Arc<PauseGate>,
    pub cancel: Arc<CancelSignal>,
    pub pacer: Arc<Pacer>,
    pub task_downloaded: Arc<AtomicU64>,
}

/// Streams the whole resource into `<final_path>.tmp`, resuming (via `Range`)
/// if that file already has bytes, and leaves it in place for the Task
/// Runner to rename on success — there is no merge step in this path.
pub fn fetch_single_stream(ctx: &SingleStreamContext) -> Result<u64, SegmentError> {
    let tmp = crate::storage::tmp_path(ctx.final_path);
    let existing = std::fs::metadata(&tmp).map(|m| m.len()).unwrap_or(0);

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&tmp)
        .map_err(SegmentError::Storage)?;
    file.seek(SeekFrom::End(0)).map_err(SegmentError::Storage)?;

    let mut easy = curl::easy::Easy::new();
    easy.url(ctx.url).map_err(SegmentError::Curl)?;
    easy.useragent(ctx.user_agent).map_err(SegmentError::Curl)?;
    if !ctx.proxy.is_empty() {
        easy.proxy(ctx.proxy).map_err(SegmentError::Curl)?;
    }
    easy.follow_location(true).map_err(SegmentError::Curl)?;
    easy.connect_timeout(ctx.timeout).map_err(SegmentError::Curl)?;
    easy.timeout(ctx.timeout).map_err(SegmentError::Curl)?;
    if existing > 0 {
        easy.range(&format!("bytes={existing}-")).map_err(SegmentError::Curl)?;
    }

    let written = RefCell::new(existing);
    let cancelled = RefCell::new(false);

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                ctx.pause_gate.wait_if_paused();
                if ctx.cancel.is_raised() {
                    *cancelled.borrow_mut() = true;
                    return Ok(0);
                }
                ctx.pacer.consume(data.len());
                if file.write_all(data).is_err() {
                    return Ok(0);
                }
                *written.borrow_mut() += data.len() as u64;
                ctx.task_downloaded.fetch_add(data.len() as u64, Ordering::SeqCst);
                Ok(data.len())
            })
            .map_err(SegmentError::Curl)?;
        transfer.perform().map_err(SegmentError::Curl)?;
    }

    if *cancelled.borrow() {
        return Err(SegmentError::PartialTransfer {
            expected: 0,
            received: *written.borrow(),
        });
    }

    let code = easy.response_code().map_err(SegmentError::Curl)?;
    if code != 200 && code != 206 {
        return Err(SegmentError::Http(code));
    }

    file.sync_all().map_err(SegmentError::Storage)?;
    Ok(*written.borrow())
}
