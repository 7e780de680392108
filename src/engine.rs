//! Quorum engine
//!
//! Owns the wallet store and device registry for one session and is the
//! only path through which a wallet's signer list grows.
//!
//! Per wallet, `add_signer` moves through two states defined purely by
//! signer count: Incomplete (`len < n`) and Complete (`len == n`). Complete
//! is terminal; further additions are rejected rather than ignored.

use crate::audit::AuditLog;
use crate::config::{Config, QuorumLimits};
use crate::device::{Device, DeviceId, DeviceRegistry};
use crate::selection::{ActiveWalletSelector, CandidateSelector};
use crate::wallet::{Balances, Wallet, WalletId, WalletStore};
use crate::{Error, Result};

/// Signer quorum and wallet selection engine
#[derive(Debug, Default)]
pub struct QuorumEngine {
    store: WalletStore,
    devices: DeviceRegistry,
    audit: Option<AuditLog>,
}

impl QuorumEngine {
    pub fn new(limits: QuorumLimits) -> Self {
        Self {
            store: WalletStore::new(limits),
            devices: DeviceRegistry::new(),
            audit: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let engine = Self::new(config.limits);
        match &config.audit_log_path {
            Some(path) => engine.with_audit_log(AuditLog::new(path)),
            None => engine,
        }
    }

    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn active(&self) -> ActiveWalletSelector<'_> {
        ActiveWalletSelector::new(&self.store)
    }

    pub fn candidates(&self) -> CandidateSelector<'_> {
        CandidateSelector::new(&self.store, &self.devices)
    }

    pub fn load(&self, wallets: impl IntoIterator<Item = Wallet>) -> Result<()> {
        self.store.load(wallets)
    }

    pub fn upsert_devices(&self, devices: impl IntoIterator<Item = Device>) {
        self.devices.upsert(devices)
    }

    pub fn replace_balances(&self, wallet_id: &WalletId, balances: Balances) -> Result<()> {
        self.store.replace_balances(wallet_id, balances)
    }

    pub fn select_active(&self) -> Option<Wallet> {
        self.active().select_active()
    }

    pub fn set_active(&self, wallet_id: &WalletId) -> Result<()> {
        self.active().set_active(wallet_id)
    }

    pub fn candidates_for(&self, wallet_id: &WalletId) -> Result<Vec<Device>> {
        self.candidates().candidates_for(wallet_id)
    }

    /// Attach a device as the next signer of a wallet.
    ///
    /// Checks, in order: the wallet exists, it still has an open slot, the
    /// device is known, it is unlocked, and it is not already a signer.
    /// On success the signer is appended at the end and the updated wallet
    /// is returned. The whole sequence runs under the wallet's lock.
    pub fn add_signer(&self, wallet_id: &WalletId, device_id: &DeviceId) -> Result<Wallet> {
        let result = self.store.with_wallet_mut(wallet_id, |wallet| {
            if wallet.is_ready() {
                return Err(Error::QuorumAlreadyComplete {
                    wallet_id: wallet_id.to_string(),
                    n: wallet.n(),
                });
            }
            if !self.devices.is_unlocked(device_id)? {
                return Err(Error::DeviceLocked(device_id.to_string()));
            }
            if wallet.has_signer(device_id) {
                return Err(Error::DuplicateSigner {
                    wallet_id: wallet_id.to_string(),
                    device_id: device_id.to_string(),
                });
            }

            let order = wallet.push_signer(device_id.clone()).order;
            tracing::info!(
                wallet_id = %wallet_id,
                device_id = %device_id,
                order,
                "Registered signer"
            );
            if wallet.is_ready() {
                tracing::info!(
                    wallet_id = %wallet_id,
                    m = wallet.m(),
                    n = wallet.n(),
                    "All signers present"
                );
            }
            Ok(wallet.clone())
        });

        if let Err(e) = &result {
            tracing::debug!(
                wallet_id = %wallet_id,
                device_id = %device_id,
                error = %e,
                "Rejected signer"
            );
        }
        if let Some(audit) = &self.audit {
            audit.record_add_signer(wallet_id, device_id, &result);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};

    fn engine_with(wallets: Vec<Wallet>, devices: Vec<Device>) -> QuorumEngine {
        let engine = QuorumEngine::default();
        engine.load(wallets).unwrap();
        engine.upsert_devices(devices);
        engine
    }

    fn unlocked(ids: &[&str]) -> Vec<Device> {
        ids.iter()
            .map(|id| Device::new(*id, format!("device {}", id), true))
            .collect()
    }

    fn signer_ids(wallet: &Wallet) -> Vec<&str> {
        wallet
            .signers()
            .iter()
            .map(|s| s.device_id.as_str())
            .collect()
    }

    #[test]
    fn two_of_three_fills_then_rejects() {
        let engine = engine_with(
            vec![Wallet::new("w", "Vault", 2, 3).with_signers(["A"])],
            unlocked(&["A", "B", "C", "D"]),
        );
        let w = WalletId::from("w");

        let wallet = engine.add_signer(&w, &"B".into()).unwrap();
        assert_eq!(signer_ids(&wallet), ["A", "B"]);
        assert!(!wallet.is_ready());
        assert_eq!(wallet.remaining(), 1);

        let wallet = engine.add_signer(&w, &"C".into()).unwrap();
        assert_eq!(signer_ids(&wallet), ["A", "B", "C"]);
        assert!(wallet.is_ready());

        let err = engine.add_signer(&w, &"D".into()).unwrap_err();
        assert!(matches!(err, Error::QuorumAlreadyComplete { n: 3, .. }));
        assert_eq!(engine.store().get(&w).unwrap().signers().len(), 3);
    }

    #[test]
    fn duplicate_signer_leaves_state_unchanged() {
        let engine = engine_with(
            vec![Wallet::new("w", "Vault", 2, 3).with_signers(["A"])],
            unlocked(&["A"]),
        );
        let before = engine.store().get(&"w".into()).unwrap();

        let err = engine.add_signer(&"w".into(), &"A".into()).unwrap_err();
        assert!(matches!(err, Error::DuplicateSigner { .. }));
        assert_eq!(engine.store().get(&"w".into()).unwrap(), before);
    }

    #[test]
    fn repeated_add_is_rejected_the_second_time() {
        let engine = engine_with(vec![Wallet::new("w", "Vault", 1, 3)], unlocked(&["A"]));
        let w = WalletId::from("w");

        let first = engine.add_signer(&w, &"A".into()).unwrap();
        assert!(matches!(
            engine.add_signer(&w, &"A".into()),
            Err(Error::DuplicateSigner { .. })
        ));
        assert_eq!(engine.store().get(&w).unwrap(), first);
    }

    #[test]
    fn failure_modes_are_checked_in_order() {
        let engine = engine_with(
            vec![
                Wallet::new("full", "Full", 1, 1).with_signers(["A"]),
                Wallet::new("open", "Open", 1, 2).with_signers(["A"]),
            ],
            vec![
                Device::new("A", "Ledger", true),
                Device::new("L", "Locked", false),
            ],
        );

        // Unknown wallet wins over everything else
        assert!(matches!(
            engine.add_signer(&"nope".into(), &"ghost".into()),
            Err(Error::UnknownWallet(_))
        ));
        // Complete wallet wins over unknown device
        assert!(matches!(
            engine.add_signer(&"full".into(), &"ghost".into()),
            Err(Error::QuorumAlreadyComplete { .. })
        ));
        assert!(matches!(
            engine.add_signer(&"open".into(), &"ghost".into()),
            Err(Error::UnknownDevice(_))
        ));
        assert!(matches!(
            engine.add_signer(&"open".into(), &"L".into()),
            Err(Error::DeviceLocked(_))
        ));
        assert!(matches!(
            engine.add_signer(&"open".into(), &"A".into()),
            Err(Error::DuplicateSigner { .. })
        ));
    }

    #[test]
    fn locked_device_becomes_candidate_after_unlock() {
        let engine = engine_with(
            vec![Wallet::new("w", "Vault", 1, 2)],
            vec![Device::new("X", "Coldcard", false)],
        );
        let w = WalletId::from("w");

        assert!(engine.candidates_for(&w).unwrap().is_empty());
        engine.upsert_devices([Device::new("X", "Coldcard", true)]);
        let candidates = engine.candidates_for(&w).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id.as_str(), "X");
    }

    #[test]
    fn attached_device_drops_out_of_candidates() {
        let engine = engine_with(vec![Wallet::new("w", "Vault", 1, 3)], unlocked(&["A", "B"]));
        let w = WalletId::from("w");

        engine.add_signer(&w, &"A".into()).unwrap();
        let candidates = engine.candidates_for(&w).unwrap();
        let ids: Vec<_> = candidates.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["B"]);
    }

    #[test]
    fn set_active_missing_keeps_selection() {
        let engine = engine_with(vec![Wallet::new("w", "Vault", 1, 1)], vec![]);
        assert!(engine.select_active().is_none());

        assert!(matches!(
            engine.set_active(&"missing-id".into()),
            Err(Error::UnknownWallet(_))
        ));
        assert!(engine.select_active().is_none());

        engine.set_active(&"w".into()).unwrap();
        assert!(engine.set_active(&"missing-id".into()).is_err());
        assert_eq!(engine.select_active().unwrap().id().as_str(), "w");
    }

    #[test]
    fn active_view_tracks_mutations() {
        let engine = engine_with(vec![Wallet::new("w", "Vault", 1, 2)], unlocked(&["A"]));
        engine.set_active(&"w".into()).unwrap();
        engine.add_signer(&"w".into(), &"A".into()).unwrap();
        engine
            .replace_balances(&"w".into(), Balances::new(120_000, 0))
            .unwrap();

        let active = engine.select_active().unwrap();
        assert_eq!(signer_ids(&active), ["A"]);
        assert_eq!(active.balances().confirmed, 120_000);
    }

    #[test]
    fn reload_drops_missing_active_wallet() {
        let engine = engine_with(
            vec![Wallet::new("a", "A", 1, 1), Wallet::new("b", "B", 1, 1)],
            vec![],
        );
        engine.set_active(&"a".into()).unwrap();
        engine.load([Wallet::new("b", "B", 1, 1)]).unwrap();

        assert!(engine.select_active().is_none());
        let ids: Vec<_> = engine
            .store()
            .list()
            .iter()
            .map(|w| w.id().to_string())
            .collect();
        assert_eq!(ids, ["b"]);
    }

    #[test]
    fn concurrent_adds_never_overfill() {
        let device_ids: Vec<String> = (0..8).map(|i| format!("dev-{}", i)).collect();
        let engine = Arc::new(QuorumEngine::default());
        engine.load([Wallet::new("w", "Vault", 2, 3)]).unwrap();
        engine.upsert_devices(
            device_ids
                .iter()
                .map(|id| Device::new(id.as_str(), id.as_str(), true)),
        );

        let barrier = Arc::new(Barrier::new(device_ids.len()));
        let handles: Vec<_> = device_ids
            .iter()
            .cloned()
            .map(|id| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.add_signer(&"w".into(), &DeviceId::new(id))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 3);
        for result in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(result, Err(Error::QuorumAlreadyComplete { .. })));
        }

        let wallet = engine.store().get(&"w".into()).unwrap();
        assert!(wallet.is_ready());
        let distinct: HashSet<_> = wallet.signers().iter().map(|s| &s.device_id).collect();
        assert_eq!(distinct.len(), 3);
        let orders: Vec<_> = wallet.signers().iter().map(|s| s.order).collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[test]
    fn same_device_raced_is_attached_once() {
        let engine = Arc::new(QuorumEngine::default());
        engine.load([Wallet::new("w", "Vault", 1, 5)]).unwrap();
        engine.upsert_devices([Device::new("A", "Ledger", true)]);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.add_signer(&"w".into(), &"A".into()))
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(successes, 1);
        assert_eq!(engine.store().get(&"w".into()).unwrap().signers().len(), 1);
    }

    #[test]
    fn audit_log_records_every_request() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let engine =
            QuorumEngine::default().with_audit_log(AuditLog::new(temp_file.path()));
        engine.load([Wallet::new("w", "Vault", 1, 1)]).unwrap();
        engine.upsert_devices(unlocked(&["A", "B"]));

        engine.add_signer(&"w".into(), &"A".into()).unwrap();
        engine.add_signer(&"w".into(), &"B".into()).unwrap_err();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"status\":\"success\""));
        assert!(content.contains("\"status\":\"rejected\""));
    }
}
