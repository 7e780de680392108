use crate::wallet::{Wallet, WalletId, WalletStore};
use crate::Result;

/// The wallet currently selected for display and mutation, if any.
///
/// There is no fallback to the first wallet: "no active wallet" is a valid
/// state and callers render it as such.
#[derive(Debug, Clone, Copy)]
pub struct ActiveWalletSelector<'a> {
    store: &'a WalletStore,
}

impl<'a> ActiveWalletSelector<'a> {
    pub fn new(store: &'a WalletStore) -> Self {
        Self { store }
    }

    pub fn select_active(&self) -> Option<Wallet> {
        self.store.active()
    }

    pub fn active_id(&self) -> Option<WalletId> {
        self.store.active_id()
    }

    /// Fails with `UnknownWallet` and leaves the selection untouched if the
    /// id is not loaded.
    pub fn set_active(&self, id: &WalletId) -> Result<()> {
        self.store.set_active(id)
    }

    pub fn clear_active(&self) {
        self.store.clear_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuorumLimits;
    use crate::Error;

    #[test]
    fn no_implicit_first_wallet() {
        let store = WalletStore::new(QuorumLimits::default());
        store
            .load([Wallet::new("a", "A", 1, 1), Wallet::new("b", "B", 1, 1)])
            .unwrap();
        let selector = ActiveWalletSelector::new(&store);
        assert!(selector.select_active().is_none());
    }

    #[test]
    fn unknown_id_keeps_previous_selection() {
        let store = WalletStore::new(QuorumLimits::default());
        store.load([Wallet::new("a", "A", 1, 1)]).unwrap();
        let selector = ActiveWalletSelector::new(&store);

        assert!(matches!(
            selector.set_active(&"missing-id".into()),
            Err(Error::UnknownWallet(_))
        ));
        assert!(selector.select_active().is_none());

        selector.set_active(&"a".into()).unwrap();
        assert!(selector.set_active(&"missing-id".into()).is_err());
        assert_eq!(selector.select_active().unwrap().id().as_str(), "a");
    }

    #[test]
    fn clear_returns_to_no_active_wallet() {
        let store = WalletStore::new(QuorumLimits::default());
        store.load([Wallet::new("a", "A", 1, 1)]).unwrap();
        let selector = ActiveWalletSelector::new(&store);

        selector.set_active(&"a".into()).unwrap();
        selector.clear_active();
        assert!(selector.active_id().is_none());
    }
}
