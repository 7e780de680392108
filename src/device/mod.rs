//! Signing devices
//!
//! Devices are created and updated by the external device provider. The
//! engine only ever reads a device's `id` and `unlocked` status; the rest is
//! carried through for display collaborators.

mod registry;

pub use registry::DeviceRegistry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque device identity (e.g. a master key fingerprint)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Capabilities a device advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    DisplayAddress,
    SignPsbt,
    ExportXpub,
    Multisig,
}

/// A known signing device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub label: String,
    pub unlocked: bool,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

impl Device {
    pub fn new(id: impl Into<String>, label: impl Into<String>, unlocked: bool) -> Self {
        Self {
            id: DeviceId::new(id),
            label: label.into(),
            unlocked,
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_default_to_empty() {
        let device: Device = serde_json::from_value(serde_json::json!({
            "id": "d0a1b2c3",
            "label": "Coldcard",
            "unlocked": true
        }))
        .expect("parse device");
        assert_eq!(device.id.as_str(), "d0a1b2c3");
        assert!(device.capabilities.is_empty());
    }

    #[test]
    fn capabilities_use_snake_case() {
        let device = Device::new("d1", "Trezor", false).with_capability(Capability::SignPsbt);
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["capabilities"], serde_json::json!(["sign_psbt"]));
        assert!(device.has_capability(Capability::SignPsbt));
        assert!(!device.has_capability(Capability::Multisig));
    }
}
