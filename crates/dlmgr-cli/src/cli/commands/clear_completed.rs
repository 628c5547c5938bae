//! `dlmgr clear-completed` – drop finished tasks from the Task Store.

use anyhow::Result;
use dlmgr_core::Engine;

pub fn run_clear_completed(engine: &Engine) -> Result<()> {
    engine.clear_completed();
    println!("Cleared completed tasks");
    Ok(())
}
