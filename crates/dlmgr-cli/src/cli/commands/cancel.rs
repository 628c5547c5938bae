//! `dlmgr cancel <id>` – cancel a task, wherever it is in its lifecycle.

use anyhow::Result;
use dlmgr_core::{Engine, TaskID};

pub async fn run_cancel(engine: &Engine, id: u64) -> Result<()> {
    engine.cancel(TaskID::new(id)).await?;
    println!("Cancelled task {id}");
    Ok(())
}
