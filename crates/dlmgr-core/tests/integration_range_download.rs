//! Integration test: local HTTP server with Range support, end to end through
//! the embedded engine.
//!
//! Starts a minimal range-capable server, adds a task, runs it through the
//! Scheduler, and asserts the downloaded file matches the served body.

mod common;

use dlmgr_core::config::Config;
use dlmgr_core::engine::Engine;
use dlmgr_core::task::TaskStatus;
use tempfile::tempdir;
use tokio::time::{sleep, Duration};

async fn run_to_completion(engine: &Engine, url: &str) -> dlmgr_core::task::TaskSnapshot {
    let id = engine.add_task(url).await.expect("add_task");
    engine.start().await;
    let snap = loop {
        let snap = engine.get_task(id).expect("task exists");
        if snap.status.is_terminal() || snap.status == TaskStatus::Failed {
            break snap;
        }
        sleep(Duration::from_millis(20)).await;
    };
    engine.stop().await;
    snap
}

#[tokio::test]
async fn multi_segment_download_completes_and_file_matches() {
    let body: Vec<u8> = (0u8..100).cycle().take(64 * 1024).collect();
    let url = common::range_server::start(body.clone());

    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let engine = Engine::with_state_path(
        Config {
            download_dir: download_dir.path().to_path_buf(),
            resume_on_startup: false,
            ..Config::default()
        },
        Some(state_dir.path().join("state.json")),
    );

    let snap = run_to_completion(&engine, &url).await;
    assert_eq!(snap.status, TaskStatus::Completed, "task should complete");
    assert!(snap.filepath.exists(), "final file should exist");
    let content = std::fs::read(&snap.filepath).unwrap();
    assert_eq!(content.len(), body.len(), "file size must match");
    assert_eq!(content, body, "file content must match");
}

#[tokio::test]
async fn head_blocked_falls_back_to_range_probe_and_completes() {
    let body: Vec<u8> = (0u8..100).cycle().take(32 * 1024).collect();
    let url = common::range_server::start_with_options(
        body.clone(),
        common::range_server::RangeServerOptions {
            head_allowed: false,
            support_ranges: true,
            advertise_ranges: true,
        },
    );

    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let engine = Engine::with_state_path(
        Config {
            download_dir: download_dir.path().to_path_buf(),
            resume_on_startup: false,
            ..Config::default()
        },
        Some(state_dir.path().join("state.json")),
    );

    let snap = run_to_completion(&engine, &url).await;
    assert_eq!(snap.status, TaskStatus::Completed);
    let content = std::fs::read(&snap.filepath).unwrap();
    assert_eq!(content, body);
}

#[tokio::test]
async fn no_range_server_falls_back_to_single_stream_get() {
    let body: Vec<u8> = (0u8..100).cycle().take(32 * 1024).collect();
    let url = common::range_server::start_with_options(
        body.clone(),
        common::range_server::RangeServerOptions {
            head_allowed: true,
            support_ranges: false,
            advertise_ranges: false,
        },
    );

    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let engine = Engine::with_state_path(
        Config {
            download_dir: download_dir.path().to_path_buf(),
            resume_on_startup: false,
            ..Config::default()
        },
        Some(state_dir.path().join("state.json")),
    );

    let snap = run_to_completion(&engine, &url).await;
    assert_eq!(snap.status, TaskStatus::Completed);
    let content = std::fs::read(&snap.filepath).unwrap();
    assert_eq!(content, body);
}
