//! Signer bindings
//!
//! A signer binds one device identity to one of a wallet's `n` slots. The
//! engine treats the device id as opaque; key material and derivation live
//! with the external collaborators.

use crate::device::DeviceId;
use serde::{Deserialize, Serialize};

/// A device attached to a wallet, at a fixed position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub device_id: DeviceId,
    /// Insertion index. Downstream script ordering depends on it.
    pub order: usize,
}

impl Signer {
    pub fn new(device_id: DeviceId, order: usize) -> Self {
        Self { device_id, order }
    }
}
