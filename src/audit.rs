//! Audit log
//!
//! Appends one JSON line per signer-addition request, committed or
//! rejected. Write failures are logged and never affect the request.

use crate::device::DeviceId;
use crate::wallet::{Wallet, WalletId};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    id: Uuid,
    timestamp: DateTime<Utc>,
    action: &'static str,
    wallet_id: &'a str,
    device_id: &'a str,
    status: &'static str,
    signers: Option<usize>,
    ready: Option<bool>,
    error: Option<String>,
}

/// Writer for audit log entries
#[derive(Debug)]
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// JSONL audit trail of signer additions
#[derive(Debug)]
pub struct AuditLog {
    writer: Mutex<AuditLogWriter>,
}

impl AuditLog {
    /// # Arguments
    /// * `log_path` - Path to the audit log file (JSONL format)
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Mutex::new(AuditLogWriter::new(log_path.into())),
        }
    }

    pub(crate) fn record_add_signer(
        &self,
        wallet_id: &WalletId,
        device_id: &DeviceId,
        result: &Result<Wallet>,
    ) {
        let (status, signers, ready, error) = match result {
            Ok(wallet) => (
                "success",
                Some(wallet.signers().len()),
                Some(wallet.is_ready()),
                None,
            ),
            Err(e) => ("rejected", None, None, Some(e.to_string())),
        };

        let entry = AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: "add_signer",
            wallet_id: wallet_id.as_str(),
            device_id: device_id.as_str(),
            status,
            signers,
            ready,
            error,
        };

        let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}
