//! State Persistence: atomic JSON snapshot of the Task Store.
//!
//! Mirrors how this codebase already persists small JSON documents to the
//! XDG state directory: write to a sibling temp file, fsync, then rename
//! over the real path so a reader never observes a half-written snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::task::Task;

const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Serialize, Deserialize, Default)]
struct StateFile {
    tasks: Vec<Task>,
}

pub fn state_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlmgr")?;
    let dir = xdg_dirs.get_state_home().join("dlmgr");
    fs::create_dir_all(&dir).context("creating state directory")?;
    Ok(dir.join(STATE_FILE_NAME))
}

/// Writes `tasks` to `path` via write-temp-then-rename.
pub fn save_snapshot(path: &Path, tasks: Vec<Task>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("creating state directory")?;
    }
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(&StateFile { tasks })?;
    fs::write(&tmp, &body).context("writing state snapshot")?;
    fs::rename(&tmp, path).context("renaming state snapshot into place")?;
    Ok(())
}

/// Loads a previously saved snapshot, or an empty one if the file is missing.
pub fn load_snapshot(path: &Path) -> Result<Vec<Task>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path).context("reading state snapshot")?;
    let parsed: StateFile = serde_json::from_str(&data).context("parsing state snapshot")?;
    Ok(parsed.tasks)
}
