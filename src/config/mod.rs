//! Configuration for the quorum engine and its file-backed collaborators
//!
//! Values come from, in increasing priority:
//! 1. Built-in defaults
//! 2. A JSON config file (`--config`)
//! 3. Environment variables (`QUORUM_WALLETS_DIR`, `QUORUM_DEVICES_FILE`,
//!    `QUORUM_AUDIT_LOG`), including ones loaded from `.env`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable names
pub mod env_vars {
    pub const WALLETS_DIR: &str = "QUORUM_WALLETS_DIR";
    pub const DEVICES_FILE: &str = "QUORUM_DEVICES_FILE";
    pub const AUDIT_LOG: &str = "QUORUM_AUDIT_LOG";
}

/// Largest `n` accepted by default
pub const DEFAULT_MAX_SIGNERS: usize = 5;

/// Structural limits enforced on every loaded wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumLimits {
    /// Upper bound on `n`
    pub max_signers: usize,
}

impl Default for QuorumLimits {
    fn default() -> Self {
        Self {
            max_signers: DEFAULT_MAX_SIGNERS,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one `<wallet>.json` per wallet
    pub wallets_dir: PathBuf,
    /// JSON array of known devices
    pub devices_file: PathBuf,
    /// Wallet limits
    #[serde(default)]
    pub limits: QuorumLimits,
    /// Path to audit log file (JSONL), disabled when `null`
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: Option<String>,
}

fn default_audit_log_path() -> Option<String> {
    Some("audit.jsonl".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallets_dir: PathBuf::from("wallets"),
            devices_file: PathBuf::from("devices.json"),
            limits: QuorumLimits::default(),
            audit_log_path: default_audit_log_path(),
        }
    }
}

impl Config {
    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    /// File (or defaults) with environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply overrides from a variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(env_vars::WALLETS_DIR) {
            tracing::debug!(wallets_dir = %dir, "Using {}", env_vars::WALLETS_DIR);
            self.wallets_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup(env_vars::DEVICES_FILE) {
            tracing::debug!(devices_file = %file, "Using {}", env_vars::DEVICES_FILE);
            self.devices_file = PathBuf::from(file);
        }
        if let Some(path) = lookup(env_vars::AUDIT_LOG) {
            // An empty value switches the audit log off
            self.audit_log_path = Some(path).filter(|p| !p.is_empty());
        }
        self
    }

    fn check(&self) -> Result<()> {
        if self.limits.max_signers == 0 {
            return Err(Error::Config(
                "limits.max_signers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
