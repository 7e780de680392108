//! Application session
//!
//! A session owns one engine for its lifetime and drives the asynchronous
//! collaborators into it. A failed or dropped refresh never reaches the
//! store, which keeps its last good collection.

use crate::config::Config;
use crate::engine::QuorumEngine;
use crate::source::{DeviceEvent, DeviceProvider, WalletSource};
use crate::Result;
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Session-scoped owner of a quorum engine
#[derive(Debug, Clone)]
pub struct Session {
    engine: Arc<QuorumEngine>,
}

impl Session {
    pub fn new(engine: QuorumEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(QuorumEngine::from_config(config))
    }

    pub fn engine(&self) -> &QuorumEngine {
        &self.engine
    }

    /// Fetch the wallet collection and load it. Returns the wallet count.
    pub async fn refresh_wallets(&self, source: &dyn WalletSource) -> Result<usize> {
        let wallets = source.load_wallets().await?;
        let count = wallets.len();
        self.engine.load(wallets)?;
        Ok(count)
    }

    /// Enumerate devices and upsert them. Returns the device count.
    pub async fn refresh_devices(&self, provider: &dyn DeviceProvider) -> Result<usize> {
        let devices = provider.enumerate().await?;
        let count = devices.len();
        self.engine.upsert_devices(devices);
        Ok(count)
    }

    /// Apply device notifications until the stream ends.
    ///
    /// Status changes for devices the registry has never seen are skipped.
    /// Returns the number of events applied.
    pub async fn watch_devices<S>(&self, mut events: S) -> usize
    where
        S: Stream<Item = DeviceEvent> + Unpin,
    {
        let mut applied = 0;
        while let Some(event) = events.next().await {
            if self.apply_device_event(event) {
                applied += 1;
            }
        }
        tracing::debug!(applied, "Device event stream ended");
        applied
    }

    fn apply_device_event(&self, event: DeviceEvent) -> bool {
        let devices = self.engine.devices();
        let (device_id, unlocked) = match event {
            DeviceEvent::Connected { device } => {
                devices.upsert([device]);
                return true;
            }
            DeviceEvent::Unlocked { device_id } => (device_id, true),
            DeviceEvent::Locked { device_id } => (device_id, false),
        };

        match devices.set_unlocked(&device_id, unlocked) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring status change for unknown device");
                false
            }
        }
    }
}
