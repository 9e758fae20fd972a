use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::util::ChunkBounds;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
    /// Delay in milliseconds before each retry (0 = retry immediately).
    #[serde(default)]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 0,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

/// Global configuration loaded from `~/.config/chunkflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkflowConfig {
    /// Resources larger than this skip in-memory chunking and go straight to the host.
    pub max_in_memory_bytes: u64,
    /// Lower bound for a normalized chunk count.
    pub min_chunks: usize,
    /// Upper bound for a normalized chunk count.
    pub max_chunks: usize,
    /// Chunk count used when the preference is missing or unusable.
    pub default_chunks: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Connect timeout for every request, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Directory the local host writes finished files into (None = current dir).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// 500 MiB.
pub const DEFAULT_MAX_IN_MEMORY_BYTES: u64 = 500 * 1024 * 1024;

impl Default for ChunkflowConfig {
    fn default() -> Self {
        Self {
            max_in_memory_bytes: DEFAULT_MAX_IN_MEMORY_BYTES,
            min_chunks: 2,
            max_chunks: 32,
            default_chunks: 10,
            retry: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            download_dir: None,
        }
    }
}

impl ChunkflowConfig {
    pub fn chunk_bounds(&self) -> ChunkBounds {
        ChunkBounds::new(self.min_chunks, self.max_chunks, self.default_chunks)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().policy()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkflow")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkflowConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkflowConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ChunkflowConfig = toml::from_str(&data)?;
    Ok(cfg)
}
