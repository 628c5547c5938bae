//! `dlmgr retry <id>` / `dlmgr retry-failed` – re-queue failed task(s).

use anyhow::Result;
use dlmgr_core::{Engine, TaskID};

pub async fn run_retry(engine: &Engine, id: u64) -> Result<()> {
    engine.retry(TaskID::new(id)).await?;
    println!("Re-queued task {id}");
    Ok(())
}

pub async fn run_retry_failed(engine: &Engine) -> Result<()> {
    engine.retry_failed().await;
    println!("Re-queued all failed tasks");
    Ok(())
}
