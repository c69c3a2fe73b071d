use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Overrides the backend base URL when set, taking precedence over the
/// config file.
pub const BASE_URL_ENV: &str = "PDF_DASHBOARD_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend API, without a trailing slash.
    pub base_url: String,
    /// Seconds between registry refreshes from GET /files.
    pub poll_interval_secs: u64,
    /// Upload slots; queued files wait for a free slot.
    pub max_concurrent_uploads: usize,
    /// Per-request timeout for all backend calls.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_secs: 5,
            max_concurrent_uploads: 3,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads the config file, writing defaults on first run, then applies
    /// the env override. Falls back to defaults rather than failing
    /// startup.
    pub fn load() -> Self {
        let path = Self::default_path();
        let mut config = if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ignoring unreadable config");
                    Self::default()
                }
            }
        } else {
            let config = Self::default();
            if let Err(err) = config.save_to(&path) {
                tracing::debug!(path = %path.display(), %err, "could not write default config");
            }
            config
        };
        config.apply_env_override(std::env::var(BASE_URL_ENV).ok());
        config.normalize();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "apriel", "pdf-dashboard")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("pdf-dashboard.toml"))
    }

    fn apply_env_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }

    /// Keeps runtime knobs in ranges the worker can actually use.
    fn normalize(&mut self) {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self.poll_interval_secs = self.poll_interval_secs.max(1);
        self.max_concurrent_uploads = self.max_concurrent_uploads.max(1);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
    }
}
