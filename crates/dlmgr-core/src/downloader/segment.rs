//! Segment Fetcher: downloads one byte range into its part file.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::control::{CancelSignal, PauseGate};
use crate::pacer::Pacer;
use crate::retry::SegmentError;
use crate::segmenter::Segment;
use crate::storage::PartFileWriter;

/// Everything a Segment Fetcher needs beyond the Segment itself.
pub struct FetchContext<'a> {
    pub url: &'a str,
    pub final_path: &'a std::path::Path,
    pub user_agent: &'a str,
    pub proxy: &'a str,
    pub timeout: Duration,
    pub chunk_size: usize,
    pub anti_throttle_pause: bool,
    pub pause_gate: Arc<PauseGate>,
    pub cancel: Arc<CancelSignal>,
    pub pacer: Arc<Pacer>,
    /// Task-wide running total, incremented as bytes land on disk.
    pub task_downloaded: Arc<AtomicU64>,
}

/// Fetches a single segment, resuming from an existing partial part file if
/// present. Returns the final `downloaded` byte count for the segment.
pub fn fetch_segment(ctx: &FetchContext, segment: &Segment) -> Result<u64, SegmentError> {
    let expected_len = segment.len();

    let existing = crate::storage::existing_part_len(ctx.final_path, segment.index).unwrap_or(0);
    if existing == expected_len {
        return Ok(existing);
    }

    let (mut writer, resume_from, single_segment) = if existing > 0 && existing < expected_len {
        let (w, len) = PartFileWriter::open_for_append(ctx.final_path, segment.index)
            .map_err(|e| SegmentError::Storage(io_error_from_engine(e)))?;
        (w, len, false)
    } else {
        let w = PartFileWriter::create_fresh(ctx.final_path, segment.index)
            .map_err(|e| SegmentError::Storage(io_error_from_engine(e)))?;
        (w, 0, false)
    };
    let _ = single_segment;

    let range_header = format!("bytes={}-{}", segment.start + resume_from, segment.end);

    let mut easy = curl::easy::Easy::new();
    easy.url(ctx.url).map_err(SegmentError::Curl)?;
    easy.useragent(ctx.user_agent).map_err(SegmentError::Curl)?;
    if !ctx.proxy.is_empty() {
        easy.proxy(ctx.proxy).map_err(SegmentError::Curl)?;
    }
    easy.follow_location(true).map_err(SegmentError::Curl)?;
    easy.connect_timeout(ctx.timeout).map_err(SegmentError::Curl)?;
    easy.timeout(ctx.timeout).map_err(SegmentError::Curl)?;
    easy.range(&range_header).map_err(SegmentError::Curl)?;

    let written = RefCell::new(resume_from);
    let anti_throttle_fired = RefCell::new(false);
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

                if let Err(_e) = writer.write(data) {
                    return Ok(0);
                }

                let mut w = written.borrow_mut();
                *w += data.len() as u64;
                ctx.task_downloaded.fetch_add(data.len() as u64, Ordering::SeqCst);

                if ctx.anti_throttle_pause && !*anti_throttle_fired.borrow() {
                    let fraction = *w as f64 / expected_len as f64;
                    if fraction >= 0.92 {
                        *anti_throttle_fired.borrow_mut() = true;
                        std::thread::sleep(Duration::from_secs(5));
                    }
                }

                Ok(data.len())
            })
            .map_err(SegmentError::Curl)?;
        transfer.perform().map_err(SegmentError::Curl)?;
    }

    if *cancelled.borrow() {
        return Err(SegmentError::PartialTransfer {
            expected: expected_len,
            received: *written.borrow(),
        });
    }

    let code = easy.response_code().map_err(SegmentError::Curl)?;
    if code != 206 && code != 200 {
        return Err(SegmentError::Http(code));
    }

    writer.sync().map_err(|e| SegmentError::Storage(io_error_from_engine(e)))?;

    let final_written = *written.borrow();
    if final_written != expected_len {
        return Err(SegmentError::PartialTransfer {
            expected: expected_len,
            received: final_written,
        });
    }

    Ok(final_written)
}

fn io_error_from_engine(e: crate::error::EngineError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}
