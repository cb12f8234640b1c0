//! Keeper configuration

use anyhow::{Context, Result};
use coinpair_common::Bytes32;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "COINPAIR_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "keeper-config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// JSON snapshot backing the local ledger
    pub ledger_snapshot: String,

    /// Directory polled for `*.offer` files
    pub offer_dir: String,

    /// Router singleton, if one has been launched
    #[serde(default)]
    pub router_launcher_id: Option<Bytes32>,

    /// Pairs to sync and settle against
    #[serde(default)]
    pub pairs: Vec<Bytes32>,

    /// Polling interval in seconds
    pub poll_interval_secs: u64,

    /// How long a fetched mempool snapshot is reused
    pub mempool_cache_ttl_secs: u64,

    /// Chain new transitions onto pending mempool spends
    pub use_mempool: bool,
}

impl Config {
    /// Load configuration from the TOML file named by `COINPAIR_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let config_str = std::fs::read_to_string(expanded.as_ref())
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Configuration for a keeper running against a local snapshot ledger
    pub fn default_local() -> Self {
        Self {
            ledger_snapshot: "~/.coinpair/ledger.json".to_string(),
            offer_dir: "~/.coinpair/offers".to_string(),
            router_launcher_id: None,
            pairs: Vec::new(),
            poll_interval_secs: 2,
            mempool_cache_ttl_secs: 10,
            use_mempool: false,
        }
    }

    pub fn ledger_snapshot_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.ledger_snapshot).as_ref())
    }

    pub fn offer_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.offer_dir).as_ref())
    }

    pub fn mempool_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.mempool_cache_ttl_secs)
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_local();
        let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;

        std::fs::write(path, toml_str).context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
