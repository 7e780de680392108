//! Wallet collection store
//!
//! Owns the loaded wallets and the active selection. Both live behind one
//! `RwLock` so that a load and the clearing of a dangling selection are a
//! single atomic update. Each wallet additionally sits behind its own
//! `Mutex`, which serializes read-check-append sequences per wallet while
//! leaving other wallets free.

use super::{Balances, Wallet, WalletId};
use crate::config::QuorumLimits;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Collection {
    /// Load order
    wallets: Vec<Arc<Mutex<Wallet>>>,
    index: HashMap<WalletId, usize>,
    active: Option<WalletId>,
}

impl Collection {
    fn entry(&self, id: &WalletId) -> Option<&Arc<Mutex<Wallet>>> {
        self.index.get(id).map(|&i| &self.wallets[i])
    }
}

fn snapshot(wallet: &Mutex<Wallet>) -> Wallet {
    wallet.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Store for the wallet collection and active selection
#[derive(Debug, Default)]
pub struct WalletStore {
    inner: RwLock<Collection>,
    limits: QuorumLimits,
}

impl WalletStore {
    pub fn new(limits: QuorumLimits) -> Self {
        Self {
            inner: RwLock::new(Collection::default()),
            limits,
        }
    }

    pub fn limits(&self) -> &QuorumLimits {
        &self.limits
    }

    /// Replace the entire collection.
    ///
    /// Every wallet is validated before anything is swapped in; on error
    /// the previous collection stays in place. An active selection that
    /// does not survive the load is cleared in the same update.
    pub fn load(&self, wallets: impl IntoIterator<Item = Wallet>) -> Result<()> {
        let wallets: Vec<Wallet> = wallets.into_iter().collect();

        let mut ids = HashSet::with_capacity(wallets.len());
        for wallet in &wallets {
            wallet.validate(self.limits.max_signers)?;
            if !ids.insert(wallet.id().clone()) {
                return Err(Error::InvalidWallet {
                    wallet_id: wallet.id().to_string(),
                    reason: "wallet id appears more than once in load".to_string(),
                });
            }
        }

        let index = wallets
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id().clone(), i))
            .collect::<HashMap<_, _>>();
        let wallets = wallets
            .into_iter()
            .map(|w| Arc::new(Mutex::new(w)))
            .collect();

        let mut inner = self.write();
        let previous = inner.active.take();
        let active = previous.clone().filter(|id| index.contains_key(id));
        if let (Some(previous), None) = (&previous, &active) {
            tracing::debug!(wallet_id = %previous, "Active wallet dropped by load");
        }
        *inner = Collection {
            wallets,
            index,
            active,
        };

        tracing::info!(wallets = inner.wallets.len(), "Loaded wallet collection");
        Ok(())
    }

    pub fn get(&self, id: &WalletId) -> Option<Wallet> {
        self.read().entry(id).map(|w| snapshot(w))
    }

    /// All wallets in load order
    pub fn list(&self) -> Vec<Wallet> {
        self.read().wallets.iter().map(|w| snapshot(w)).collect()
    }

    pub fn contains(&self, id: &WalletId) -> bool {
        self.read().index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().wallets.is_empty()
    }

    /// Replace a wallet's balances wholesale
    pub fn replace_balances(&self, id: &WalletId, balances: Balances) -> Result<()> {
        self.with_wallet_mut(id, |wallet| {
            wallet.set_balances(balances);
            tracing::debug!(
                wallet_id = %id,
                confirmed = balances.confirmed,
                unconfirmed = balances.unconfirmed,
                "Replaced balances"
            );
            Ok(())
        })
    }

    pub fn active_id(&self) -> Option<WalletId> {
        self.read().active.clone()
    }

    /// The active wallet, if one is selected
    pub fn active(&self) -> Option<Wallet> {
        let inner = self.read();
        inner
            .active
            .as_ref()
            .and_then(|id| inner.entry(id))
            .map(|w| snapshot(w))
    }

    pub fn set_active(&self, id: &WalletId) -> Result<()> {
        let mut inner = self.write();
        if !inner.index.contains_key(id) {
            return Err(Error::UnknownWallet(id.to_string()));
        }
        inner.active = Some(id.clone());
        tracing::debug!(wallet_id = %id, "Active wallet selected");
        Ok(())
    }

    pub fn clear_active(&self) {
        self.write().active = None;
    }

    /// Run `f` against a wallet while holding its lock
    pub(crate) fn with_wallet<R>(&self, id: &WalletId, f: impl FnOnce(&Wallet) -> R) -> Result<R> {
        let inner = self.read();
        let entry = inner
            .entry(id)
            .ok_or_else(|| Error::UnknownWallet(id.to_string()))?;
        let wallet = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&*wallet))
    }

    /// Run `f` against a wallet with exclusive access to it.
    ///
    /// The collection read lock is held throughout, so a concurrent load
    /// cannot swap the wallet out between the check and the mutation.
    pub(crate) fn with_wallet_mut<R>(
        &self,
        id: &WalletId,
        f: impl FnOnce(&mut Wallet) -> Result<R>,
    ) -> Result<R> {
        let inner = self.read();
        let entry = inner
            .entry(id)
            .ok_or_else(|| Error::UnknownWallet(id.to_string()))?;
        let mut wallet = entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *wallet)
    }

    fn read(&self) -> RwLockReadGuard<'_, Collection> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collection> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
