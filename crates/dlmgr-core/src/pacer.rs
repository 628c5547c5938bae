//! Global rate limiter applied at per-read granularity inside Segment Fetchers.
//!
//! A hand-rolled token bucket: refills continuously based on elapsed wall
//! time rather than on a tick, so it stays accurate under the threaded
//! (non-async) call pattern Segment Fetchers use. Disabled (no-op) when the
//! configured limit is 0.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Bucket {
    capacity: f64,
    tokens: f64,
    rate_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        self.last_refill = now;
    }
}

/// Shared global pacer; clone the `Arc` into every Segment Fetcher.
pub struct Pacer {
    bucket: Option<Mutex<Bucket>>,
}

impl Pacer {
    /// `max_speed_limit_bytes_per_sec == 0` disables pacing entirely.
    pub fn new(max_speed_limit_bytes_per_sec: u64) -> Arc<Self> {
        let bucket = if max_speed_limit_bytes_per_sec == 0 {
            None
        } else {
            let rate = max_speed_limit_bytes_per_sec as f64;
            Some(Mutex::new(Bucket {
                capacity: rate,
                tokens: rate,
                rate_per_sec: rate,
                last_refill: Instant::now(),
            }))
        };
        Arc::new(Self { bucket })
    }

    /// Blocks the calling thread until `n` bytes' worth of budget is available,
    /// consuming it before returning. No-op when pacing is disabled.
    pub fn consume(&self, n: usize) {
        let Some(bucket) = &self.bucket else { return };
        let mut need = n as f64;
        loop {
            let wait = {
                let mut b = bucket.lock().unwrap();
                b.refill();
                if b.tokens >= need {
                    b.tokens -= need;
                    return;
                }
                let available = b.tokens;
                b.tokens = 0.0;
                need -= available;
                Duration::from_secs_f64(need / b.rate_per_sec)
            };
            std::thread::sleep(wait.min(Duration::from_millis(250)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_pacer_never_blocks() {
        let pacer = Pacer::new(0);
        let start = Instant::now();
        pacer.consume(10_000_000);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn pacer_allows_burst_up_to_capacity() {
        let pacer = Pacer::new(1_000_000);
        let start = Instant::now();
        pacer.consume(1_000_000);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn pacer_throttles_beyond_capacity() {
        let pacer = Pacer::new(1_000_000);
        let start = Instant::now();
        pacer.consume(1_000_000);
        pacer.consume(500_000);
        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}
