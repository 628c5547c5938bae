//! `dlmgr run` – start the scheduler and watch it drain the ready-queue.

use anyhow::Result;
use dlmgr_core::Engine;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Starts the Scheduler, polls `list_tasks` until nothing is queued or
/// active, then stops it. Prints a one-line progress summary per poll.
pub async fn run_scheduler(engine: &Engine) -> Result<()> {
    engine.start().await;

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let buckets = engine.list_tasks();
        let active = buckets.get("active").map(|v| v.len()).unwrap_or(0);
        let queued = buckets.get("queued").map(|v| v.len()).unwrap_or(0);

        let (done, total): (u64, u64) = buckets
            .get("active")
            .into_iter()
            .flatten()
            .map(|t| (t.downloaded_size, t.total_size))
            .fold((0, 0), |acc, (d, t)| (acc.0 + d, acc.1 + t));

        if active + queued == 0 {
            break;
        }

        let pct = if total > 0 { done as f64 / total as f64 * 100.0 } else { 0.0 };
        print!("\r{active} active, {queued} queued, {pct:.1}% of in-flight bytes   ");
        use std::io::Write;
        std::io::stdout().flush().ok();
    }
    println!();

    engine.stop().await;

    let buckets = engine.list_tasks();
    let completed = buckets.get("completed").map(|v| v.len()).unwrap_or(0);
    let failed = buckets.get("failed").map(|v| v.len()).unwrap_or(0);
    println!("run finished: {completed} completed, {failed} failed");
    Ok(())
}
