//! Error types for the signer quorum engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Wallet {wallet_id} already has {n} of {n} required signers")]
    QuorumAlreadyComplete { wallet_id: String, n: usize },

    #[error("Device {0} is locked")]
    DeviceLocked(String),

    #[error("Device {device_id} is already a signer on wallet {wallet_id}")]
    DuplicateSigner { wallet_id: String, device_id: String },

    #[error("Invalid wallet {wallet_id}: {reason}")]
    InvalidWallet { wallet_id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller may retry the operation as-is.
    ///
    /// Validation failures mean the caller's view is stale or wrong; only
    /// collaborator I/O is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Source(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
