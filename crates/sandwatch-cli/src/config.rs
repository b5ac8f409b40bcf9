/*
[INPUT]:  Optional YAML configuration file
[OUTPUT]: Parsed playground configuration and client settings
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use sandwatch_auth::{ClientConfig, DEFAULT_BASE_URL, RefreshPolicy};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the playground
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// API gateway base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Token file; defaults to the user data directory
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// Solana CLI keypair used by `login` when no flag is given
    #[serde(default)]
    pub keypair_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Refresh behaviour of the request stage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    #[serde(default = "default_true")]
    pub persist_refreshed: bool,
    #[serde(default = "default_true")]
    pub single_flight: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            persist_refreshed: true,
            single_flight: true,
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            store_path: None,
            keypair_path: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            refresh: RefreshConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content).context("parse config yaml")?;
        Ok(config)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            refresh: RefreshPolicy {
                persist_refreshed: self.refresh.persist_refreshed,
                single_flight: self.refresh.single_flight,
            },
        }
    }

    /// Token file location: flag, then config, then `<data_dir>/sandwatch/tokens.json`
    pub fn resolve_store_path(&self, flag: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(path) = flag.or(self.store_path.as_deref()) {
            return Ok(path.to_path_buf());
        }
        let data_dir = dirs::data_dir().ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("sandwatch").join("tokens.json"))
    }
}
