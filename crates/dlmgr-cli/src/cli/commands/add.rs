//! `dlmgr add <url>` – register a new download task.

use anyhow::Result;
use dlmgr_core::Engine;

pub async fn run_add(engine: &Engine, url: &str) -> Result<()> {
    let id = engine.add_task(url).await?;
    println!("Added task {id} for URL: {url}");
    Ok(())
}
