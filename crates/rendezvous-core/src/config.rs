//! Configuration for the rendezvous store and daemon.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $RENDEZVOUS_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/rendezvous/config.toml
//!   3. ~/.config/rendezvous/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::registration::{
    DEFAULT_MAX_DISCOVER_LIMIT, DEFAULT_MAX_NAMESPACE_LEN, DEFAULT_MAX_TTL_SECS,
    DEFAULT_SWEEP_INTERVAL_SECS,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendezvousConfig {
    pub store: StoreConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database path, or ":memory:" for an ephemeral store.
    pub locator: String,
    /// Seconds between background expiry sweeps.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Most registrations a single discover call returns.
    pub max_discover_limit: u64,
    /// Longest TTL a registration may ask for.
    pub max_ttl_secs: u64,
    /// Longest namespace accepted, in bytes.
    pub max_namespace_len: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            locator: data_dir()
                .join("rendezvous.db")
                .to_string_lossy()
                .into_owned(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_discover_limit: DEFAULT_MAX_DISCOVER_LIMIT,
            max_ttl_secs: DEFAULT_MAX_TTL_SECS,
            max_namespace_len: DEFAULT_MAX_NAMESPACE_LEN,
        }
    }
}

impl StoreConfig {
    pub fn sweep_interval(&self) -> Duration {
        // A zero interval would spin the sweeper.
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("rendezvous")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("rendezvous")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RendezvousConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            RendezvousConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("RENDEZVOUS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&RendezvousConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply RENDEZVOUS_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RENDEZVOUS_STORE__LOCATOR") {
            self.store.locator = v;
        }
        if let Ok(v) = std::env::var("RENDEZVOUS_STORE__SWEEP_INTERVAL_SECS") {
            if let Ok(n) = v.parse() {
                self.store.sweep_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("RENDEZVOUS_LIMITS__MAX_DISCOVER_LIMIT") {
            if let Ok(n) = v.parse() {
                self.limits.max_discover_limit = n;
            }
        }
        if let Ok(v) = std::env::var("RENDEZVOUS_LIMITS__MAX_TTL_SECS") {
            if let Ok(n) = v.parse() {
                self.limits.max_ttl_secs = n;
            }
        }
    }
}
