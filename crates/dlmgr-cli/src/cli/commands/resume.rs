//! `dlmgr resume <id>` – resume a paused task.

use anyhow::Result;
use dlmgr_core::{Engine, TaskID};

pub fn run_resume(engine: &Engine, id: u64) -> Result<()> {
    engine.resume(TaskID::new(id))?;
    println!("Resumed task {id}");
    Ok(())
}
