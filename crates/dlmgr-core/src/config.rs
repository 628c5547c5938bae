//! Engine configuration, loaded from `~/.config/dlmgr/config.toml`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration for the download engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory new downloads are saved to.
    pub download_dir: PathBuf,
    /// Maximum number of Tasks in Probing/Downloading at once.
    pub max_concurrent_downloads: usize,
    /// Per-HTTP-request timeout (connect + read idle), in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts per segment (0 = no retries).
    pub retry_attempts: u32,
    /// User-Agent header sent on every request.
    pub user_agent: String,
    /// HTTP/HTTPS proxy URL; empty string means no proxy.
    pub proxy: String,
    /// Files at or below this size are downloaded single-stream.
    pub min_split_size: u64,
    /// Hard cap on segments per task.
    pub segment_count: usize,
    /// Read/write buffer size per segment, in bytes.
    pub segment_chunk_size: usize,
    /// Global rate limit in KB/s; 0 disables the pacer.
    pub max_speed_limit: u64,
    /// Whether newly added tasks enter the ready-queue immediately.
    pub auto_start: bool,
    /// Whether to reinstate persisted tasks (normalized to Queued) on startup.
    pub resume_on_startup: bool,
    /// Optional anti-throttle heuristic: pause 5s after crossing 92% of a segment.
    pub anti_throttle_pause: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            max_concurrent_downloads: 3,
            timeout_secs: 30,
            retry_attempts: 5,
            user_agent: concat!("dlmgr/", env!("CARGO_PKG_VERSION")).to_string(),
            proxy: String::new(),
            min_split_size: 10 * 1024 * 1024,
            segment_count: 4,
            segment_chunk_size: 64 * 1024,
            max_speed_limit: 0,
            auto_start: true,
            resume_on_startup: true,
            anti_throttle_pause: false,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlmgr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = Config::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!(path = %path.display(), "created default config");
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: Config = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.max_concurrent_downloads, 3);
        assert_eq!(cfg.segment_count, 4);
        assert_eq!(cfg.min_split_size, 10 * 1024 * 1024);
        assert!(cfg.auto_start);
        assert!(!cfg.anti_throttle_pause);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = Config::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_overrides_use_defaults() {
        let toml = r#"
            max_concurrent_downloads = 8
            segment_count = 16
        "#;
        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_concurrent_downloads, 8);
        assert_eq!(cfg.segment_count, 16);
        assert_eq!(cfg.min_split_size, Config::default().min_split_size);
    }
}
