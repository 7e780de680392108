//! External collaborators
//!
//! Wallet loading and device enumeration are asynchronous and owned by the
//! surrounding application. These traits are the seams the session drives;
//! the engine itself never performs I/O.

mod json;

pub use json::{JsonDeviceProvider, JsonWalletSource};

use crate::device::{Device, DeviceId};
use crate::wallet::Wallet;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Supplies the full wallet collection
#[async_trait]
pub trait WalletSource: Send + Sync {
    async fn load_wallets(&self) -> Result<Vec<Wallet>>;
}

/// Supplies known devices and their current status
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<Device>>;
}

/// Status notification from a device provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A device appeared or its details changed
    Connected { device: Device },
    Unlocked { device_id: DeviceId },
    Locked { device_id: DeviceId },
}
