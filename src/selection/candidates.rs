use crate::device::{Device, DeviceRegistry};
use crate::wallet::{WalletId, WalletStore};
use crate::Result;

/// Devices that could be attached to a wallet right now
#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector<'a> {
    store: &'a WalletStore,
    devices: &'a DeviceRegistry,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(store: &'a WalletStore, devices: &'a DeviceRegistry) -> Self {
        Self { store, devices }
    }

    /// Unlocked devices that are not yet signers on the wallet, ordered by id.
    ///
    /// Recomputed on every call.
    pub fn candidates_for(&self, wallet_id: &WalletId) -> Result<Vec<Device>> {
        self.store.with_wallet(wallet_id, |wallet| {
            self.devices
                .read()
                .values()
                .filter(|device| device.unlocked && !wallet.has_signer(&device.id))
                .cloned()
                .collect()
        })
    }
}
