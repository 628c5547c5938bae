//! `dlmgr status` – show status of all tasks, grouped by bucket.

use anyhow::Result;
use dlmgr_core::Engine;

pub fn run_status(engine: &Engine) -> Result<()> {
    let buckets = engine.list_tasks();
    let total: usize = buckets.values().map(|v| v.len()).sum();
    if total == 0 {
        println!("No tasks.");
        return Ok(());
    }
    for bucket in ["active", "queued", "paused", "completed", "failed"] {
        let tasks = match buckets.get(bucket) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };
        println!("{bucket}:");
        println!("  {:<6} {:<10} {:<8} {}", "ID", "SIZE", "PCT", "URL");
        for t in tasks {
            let size_str = if t.total_size > 0 {
                format!("{}", t.total_size)
            } else {
                "-".to_string()
            };
            println!(
                "  {:<6} {:<10} {:<7.1}% {}",
                t.id, size_str, t.progress, t.url
            );
            if let Some(err) = &t.error {
                println!("         error: {} ({})", err.message, err.kind);
            }
        }
    }
    Ok(())
}
