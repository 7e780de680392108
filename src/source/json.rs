//! File-backed collaborators
//!
//! Wallets are stored one per file as `<dir>/<wallet id>.json`; devices as a
//! single JSON array.

use super::{DeviceProvider, WalletSource};
use crate::device::Device;
use crate::wallet::Wallet;
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Reads wallets from a directory of JSON files
#[derive(Debug, Clone)]
pub struct JsonWalletSource {
    dir: PathBuf,
}

impl JsonWalletSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Relative file name for a wallet
    fn file_name(wallet: &Wallet) -> Result<String> {
        let id = wallet.id().as_str();
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(Error::InvalidWallet {
                wallet_id: id.to_string(),
                reason: "wallet id is not usable as a file name".to_string(),
            });
        }
        Ok(format!("{}.json", id))
    }

    /// Write a new wallet file. Never overwrites an existing one.
    pub async fn create_wallet(&self, wallet: &Wallet, max_signers: usize) -> Result<PathBuf> {
        wallet.validate(max_signers)?;
        let path = self.dir.join(Self::file_name(wallet)?);
        let content = serde_json::to_string_pretty(wallet)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::InvalidWallet {
                    wallet_id: wallet.id().to_string(),
                    reason: format!("wallet file {} already exists", path.display()),
                });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;

        tracing::info!(path = %path.display(), m = wallet.m(), n = wallet.n(), "Created wallet");
        Ok(path)
    }

    /// Write a wallet back to its file.
    ///
    /// The content goes to a hidden temp file first and is renamed over the
    /// target, so an interrupted save leaves the previous file intact.
    pub async fn save_wallet(&self, wallet: &Wallet) -> Result<PathBuf> {
        let name = Self::file_name(wallet)?;
        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!(".{}.tmp", name));
        let content = serde_json::to_string_pretty(wallet)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::info!(path = %path.display(), "Saved wallet");
        Ok(path)
    }
}

#[async_trait]
impl WalletSource for JsonWalletSource {
    /// Wallets ordered by file name. A missing directory yields no wallets.
    ///
    /// Each file must be named after the wallet it holds, since saves go
    /// to `<id>.json`.
    async fn load_wallets(&self) -> Result<Vec<Wallet>> {
        if !tokio::fs::try_exists(&self.dir).await? {
            tracing::warn!(dir = %self.dir.display(), "Wallet directory not found");
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut wallets = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read_to_string(&path).await?;
            let wallet: Wallet = serde_json::from_str(&content)
                .map_err(|e| Error::Source(format!("{}: {}", path.display(), e)))?;
            let stem = path.file_stem().and_then(|s| s.to_str());
            if stem != Some(wallet.id().as_str()) {
                return Err(Error::InvalidWallet {
                    wallet_id: wallet.id().to_string(),
                    reason: format!("stored in {}, expected {}.json", path.display(), wallet.id()),
                });
            }
            tracing::debug!(path = %path.display(), wallet_id = %wallet.id(), "Read wallet file");
            wallets.push(wallet);
        }
        Ok(wallets)
    }
}

/// Reads devices from a JSON array file
#[derive(Debug, Clone)]
pub struct JsonDeviceProvider {
    path: PathBuf,
}

impl JsonDeviceProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeviceProvider for JsonDeviceProvider {
    async fn enumerate(&self) -> Result<Vec<Device>> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::warn!(path = %self.path.display(), "Device file not found");
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Source(format!("{}: {}", self.path.display(), e)))
    }
}
