//! Device identity and the narrow lookup the manipulators need.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier the device layer assigns to a grabbed device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Used for events that do not come from a physical device.
    pub const ZERO: DeviceId = DeviceId(0);
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device:{}", self.0)
    }
}

/// Static properties of a device, as reported by the device layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub vendor_id: u32,
    #[serde(default)]
    pub product_id: u32,
    #[serde(default)]
    pub is_keyboard: bool,
    #[serde(default)]
    pub is_pointing_device: bool,
}

/// Resolves a [`DeviceId`] to its [`DeviceInfo`].
///
/// Implemented by the host's device layer; the core only reads through it.
pub trait DeviceInfoLookup: Send + Sync {
    fn device_info(&self, device_id: DeviceId) -> Option<DeviceInfo>;
}

/// A lookup that knows no devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeviceInfo;

impl DeviceInfoLookup for NoDeviceInfo {
    fn device_info(&self, _device_id: DeviceId) -> Option<DeviceInfo> {
        None
    }
}

/// A fixed table of devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfoMap {
    devices: HashMap<DeviceId, DeviceInfo>,
}

impl DeviceInfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device_id: DeviceId, info: DeviceInfo) -> Option<DeviceInfo> {
        self.devices.insert(device_id, info)
    }

    pub fn remove(&mut self, device_id: DeviceId) -> Option<DeviceInfo> {
        self.devices.remove(&device_id)
    }
}

impl DeviceInfoLookup for DeviceInfoMap {
    fn device_info(&self, device_id: DeviceId) -> Option<DeviceInfo> {
        self.devices.get(&device_id).cloned()
    }
}

impl<F> DeviceInfoLookup for F
where
    F: Fn(DeviceId) -> Option<DeviceInfo> + Send + Sync,
{
    fn device_info(&self, device_id: DeviceId) -> Option<DeviceInfo> {
        self(device_id)
    }
}
