//! CLI for the dlmgr download manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dlmgr_core::{config, Engine};

use commands::{
    run_add, run_cancel, run_clear_completed, run_pause, run_resume, run_retry,
    run_retry_failed, run_scheduler, run_status,
};

/// Top-level CLI for the dlmgr download manager.
#[derive(Debug, Parser)]
#[command(name = "dlmgr")]
#[command(about = "dlmgr: segmented HTTP/HTTPS download manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add a new download task.
    Add {
        /// Direct HTTP/HTTPS URL to download.
        url: String,
    },

    /// Start the scheduler and process queued tasks until none remain.
    Run,

    /// Show status of all tasks, grouped by active/queued/paused/completed/failed.
    Status,

    /// Pause a task by ID. No-op unless the task is currently downloading.
    Pause {
        /// Task identifier.
        id: u64,
    },

    /// Resume a paused task by its ID.
    Resume {
        /// Task identifier.
        id: u64,
    },

    /// Cancel a task by ID, wherever it is in its lifecycle.
    Cancel {
        /// Task identifier.
        id: u64,
    },

    /// Re-queue a single failed task by ID.
    Retry {
        /// Task identifier.
        id: u64,
    },

    /// Re-queue every failed task.
    RetryFailed,

    /// Drop every completed task from the task store.
    ClearCompleted,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let engine = Engine::new(cfg);

        match cli.command {
            CliCommand::Add { url } => run_add(&engine, &url).await?,
            CliCommand::Run => run_scheduler(&engine).await?,
            CliCommand::Status => run_status(&engine)?,
            CliCommand::Pause { id } => run_pause(&engine, id)?,
            CliCommand::Resume { id } => run_resume(&engine, id)?,
            CliCommand::Cancel { id } => run_cancel(&engine, id).await?,
            CliCommand::Retry { id } => run_retry(&engine, id).await?,
            CliCommand::RetryFailed => run_retry_failed(&engine).await?,
            CliCommand::ClearCompleted => run_clear_completed(&engine)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
