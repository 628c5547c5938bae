//! `dlmgr pause <id>` – pause a downloading task.

use anyhow::Result;
use dlmgr_core::{Engine, TaskID};

pub fn run_pause(engine: &Engine, id: u64) -> Result<()> {
    engine.pause(TaskID::new(id))?;
    println!("Paused task {id}");
    Ok(())
}
