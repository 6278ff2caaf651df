use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backup::BackupClient;
use crate::retry::{PolicyError, RetryCategories, RetryCategory, RetryPolicy};

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries per status check (0 disables retries).
    pub max_retries: u32,
    /// Delay before the first retry, in seconds (e.g. 0.1 = 100ms).
    pub initial_delay_secs: f64,
    /// Growth factor per retry; must be >= 1.0.
    pub backoff_multiplier: f64,
    /// Upper bound on a single backoff delay, in seconds.
    pub max_delay_secs: f64,
    /// Failure categories that are retried.
    #[serde(default = "all_categories")]
    pub categories: Vec<RetryCategory>,
}

fn all_categories() -> Vec<RetryCategory> {
    RetryCategory::ALL.to_vec()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_secs: 0.1,
            backoff_multiplier: 2.0,
            max_delay_secs: 10.0,
            categories: all_categories(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy, PolicyError> {
        RetryPolicy::new(
            self.max_retries,
            secs("initial", self.initial_delay_secs)?,
            self.backoff_multiplier,
            secs("max", self.max_delay_secs)?,
            self.categories.iter().copied().collect::<RetryCategories>(),
        )
    }
}

fn secs(field: &'static str, value: f64) -> Result<Duration, PolicyError> {
    Duration::try_from_secs_f64(value).map_err(|_| PolicyError::InvalidDelay { field, value })
}

/// Client configuration loaded from `~/.config/vsearch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server base URL.
    pub endpoint: String,
    /// Optional API key sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Interval between status polls while waiting, in milliseconds.
    pub poll_interval_ms: u64,
    /// Default budget for waiting on an operation, in seconds.
    pub wait_timeout_secs: u64,
    /// Limit for a single HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            api_key: None,
            poll_interval_ms: 250,
            wait_timeout_secs: 600,
            request_timeout_secs: 30,
            retry: None,
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        match &self.retry {
            Some(r) => r.to_policy().context("invalid [retry] section"),
            None => Ok(RetryPolicy::default()),
        }
    }

    /// Backup client for `endpoint` with the configured key and request timeout.
    pub fn backup_client(&self) -> Result<BackupClient> {
        let mut client = BackupClient::new(&self.endpoint)?
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(key) = &self.api_key {
            client = client.with_api_key(key.clone());
        }
        Ok(client)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vsearch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClientConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        let default_cfg = ClientConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: ClientConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
