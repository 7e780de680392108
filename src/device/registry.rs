//! Device registry
//!
//! Tracks known devices and their unlock status as reported by the device
//! provider. Unlock status is never computed here.

use super::{Device, DeviceId};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Registry of known signing devices
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<BTreeMap<DeviceId, Device>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace devices by id
    pub fn upsert(&self, devices: impl IntoIterator<Item = Device>) {
        let mut map = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        for device in devices {
            tracing::debug!(
                device_id = %device.id,
                unlocked = device.unlocked,
                "Upserting device"
            );
            map.insert(device.id.clone(), device);
        }
    }

    /// Record an unlock status change for a known device
    pub fn set_unlocked(&self, id: &DeviceId, unlocked: bool) -> Result<()> {
        let mut map = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let device = map
            .get_mut(id)
            .ok_or_else(|| Error::UnknownDevice(id.to_string()))?;
        device.unlocked = unlocked;
        tracing::debug!(device_id = %id, unlocked, "Device status changed");
        Ok(())
    }

    pub fn is_unlocked(&self, id: &DeviceId) -> Result<bool> {
        self.read()
            .get(id)
            .map(|device| device.unlocked)
            .ok_or_else(|| Error::UnknownDevice(id.to_string()))
    }

    pub fn get(&self, id: &DeviceId) -> Option<Device> {
        self.read().get(id).cloned()
    }

    /// All devices, ordered by id
    pub fn list(&self) -> Vec<Device> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BTreeMap<DeviceId, Device>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }
}
