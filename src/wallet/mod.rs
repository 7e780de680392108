//! Multisig wallets
//!
//! A wallet needs `m` of `n` designated signers to authorize spending. Its
//! signer list only grows, one device at a time, until all `n` slots are
//! filled; readiness is always derived from the list, never stored.

mod signer;
mod store;

pub use signer::Signer;
pub use store::WalletStore;

use crate::device::DeviceId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Wallet identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Ledger-reported balances in satoshis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub confirmed: u64,
    pub unconfirmed: u64,
}

impl Balances {
    pub fn new(confirmed: u64, unconfirmed: u64) -> Self {
        Self {
            confirmed,
            unconfirmed,
        }
    }

    pub fn total(&self) -> u64 {
        self.confirmed.saturating_add(self.unconfirmed)
    }
}

/// Quorum assembly state, derived from signer count vs `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuorumState {
    Incomplete { remaining: usize },
    Complete,
}

/// An m-of-n multisig wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    name: String,
    m: usize,
    n: usize,
    #[serde(default)]
    signers: Vec<Signer>,
    #[serde(default)]
    balances: Balances,
}

impl Wallet {
    /// New wallet with no signers and zero balances.
    ///
    /// Threshold bounds are checked when the wallet enters a store.
    pub fn new(id: impl Into<String>, name: impl Into<String>, m: usize, n: usize) -> Self {
        Self {
            id: WalletId::new(id),
            name: name.into(),
            m,
            n,
            signers: Vec::new(),
            balances: Balances::default(),
        }
    }

    /// Attach signers in the given order
    pub fn with_signers<I, D>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DeviceId>,
    {
        for device in devices {
            let order = self.signers.len();
            self.signers.push(Signer::new(device.into(), order));
        }
        self
    }

    pub fn with_balances(mut self, balances: Balances) -> Self {
        self.balances = balances;
        self
    }

    pub fn id(&self) -> &WalletId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signatures required to spend
    pub fn m(&self) -> usize {
        self.m
    }

    /// Total signers required
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn signers(&self) -> &[Signer] {
        &self.signers
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    /// All signers present
    pub fn is_ready(&self) -> bool {
        self.signers.len() == self.n
    }

    pub fn remaining(&self) -> usize {
        self.n.saturating_sub(self.signers.len())
    }

    pub fn quorum_state(&self) -> QuorumState {
        if self.is_ready() {
            QuorumState::Complete
        } else {
            QuorumState::Incomplete {
                remaining: self.remaining(),
            }
        }
    }

    pub fn has_signer(&self, device_id: &DeviceId) -> bool {
        self.signers.iter().any(|s| &s.device_id == device_id)
    }

    /// Snapshot for display collaborators
    pub fn view(&self) -> WalletView {
        WalletView {
            id: self.id.clone(),
            name: self.name.clone(),
            m: self.m,
            n: self.n,
            signers: self.signers.clone(),
            balances: self.balances,
            ready: self.is_ready(),
            remaining: self.remaining(),
        }
    }

    /// Check structural invariants against a signer cap
    pub fn validate(&self, max_signers: usize) -> Result<()> {
        let invalid = |reason: String| Error::InvalidWallet {
            wallet_id: self.id.to_string(),
            reason,
        };

        if self.m < 1 {
            return Err(invalid(format!("\"m\" ({}) must be larger than 0", self.m)));
        }
        if self.m > self.n {
            return Err(invalid(format!(
                "\"m\" ({}) must be no larger than \"n\" ({})",
                self.m, self.n
            )));
        }
        if self.n > max_signers {
            return Err(invalid(format!(
                "\"n\" ({}) cannot exceed {}",
                self.n, max_signers
            )));
        }
        if self.signers.len() > self.n {
            return Err(invalid(format!(
                "{} signers registered but only {} allowed",
                self.signers.len(),
                self.n
            )));
        }

        let mut seen = HashSet::new();
        for (position, signer) in self.signers.iter().enumerate() {
            if signer.order != position {
                return Err(invalid(format!(
                    "signer {} has order {} at position {}",
                    signer.device_id, signer.order, position
                )));
            }
            if !seen.insert(&signer.device_id) {
                return Err(invalid(format!(
                    "device {} appears more than once",
                    signer.device_id
                )));
            }
        }

        Ok(())
    }

    /// Append at the end. Callers check capacity and duplicates first.
    pub(crate) fn push_signer(&mut self, device_id: DeviceId) -> &Signer {
        let order = self.signers.len();
        self.signers.push(Signer::new(device_id, order));
        &self.signers[order]
    }

    pub(crate) fn set_balances(&mut self, balances: Balances) {
        self.balances = balances;
    }
}

/// Read-only wallet snapshot with derived fields filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletView {
    pub id: WalletId,
    pub name: String,
    pub m: usize,
    pub n: usize,
    pub signers: Vec<Signer>,
    pub balances: Balances,
    pub ready: bool,
    pub remaining: usize,
}
