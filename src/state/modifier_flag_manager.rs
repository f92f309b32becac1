//! Per-device modifier flag state.
//!
//! The manager keeps an ordered list of [`ActiveModifierFlag`] records. A
//! flag is pressed while its records sum to a positive count. Releases cancel
//! the matching press from the same device, so a device that disappears
//! mid-chord can be swept with [`ModifierFlagManager::erase_all_active_modifier_flags`]
//! without unbalancing other devices.

use crate::types::{DeviceId, ModifierFlag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a record contributes to its flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveModifierFlagType {
    /// A modifier key went down.
    Increase,
    /// A modifier key went up.
    Decrease,
    /// A lock turned on (caps lock LED). Repeating it has no further effect.
    IncreaseLock,
    /// A lock turned off.
    DecreaseLock,
}

impl ActiveModifierFlagType {
    fn is_lock(&self) -> bool {
        matches!(self, Self::IncreaseLock | Self::DecreaseLock)
    }

    fn is_decrease(&self) -> bool {
        matches!(self, Self::Decrease | Self::DecreaseLock)
    }

    fn opposite(&self) -> Self {
        match self {
            Self::Increase => Self::Decrease,
            Self::Decrease => Self::Increase,
            Self::IncreaseLock => Self::DecreaseLock,
            Self::DecreaseLock => Self::IncreaseLock,
        }
    }
}

/// One press (or lock) of a modifier flag by one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveModifierFlag {
    #[serde(rename = "type")]
    pub flag_type: ActiveModifierFlagType,
    pub modifier_flag: ModifierFlag,
    pub device_id: DeviceId,
}

impl ActiveModifierFlag {
    pub fn new(
        flag_type: ActiveModifierFlagType,
        modifier_flag: ModifierFlag,
        device_id: DeviceId,
    ) -> Self {
        Self {
            flag_type,
            modifier_flag,
            device_id,
        }
    }

    /// Contribution to the pressed count.
    pub fn count(&self) -> i32 {
        if self.flag_type.is_decrease() { -1 } else { 1 }
    }

    /// Check if `other` cancels this record.
    pub fn is_paired(&self, other: &ActiveModifierFlag) -> bool {
        self.modifier_flag == other.modifier_flag
            && self.device_id == other.device_id
            && self.flag_type.opposite() == other.flag_type
    }
}

/// Tracks which modifier flags are currently held, across all devices.
#[derive(Debug, Clone, Default)]
pub struct ModifierFlagManager {
    active_modifier_flags: Vec<ActiveModifierFlag>,
}

impl ModifierFlagManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press, release, or lock change.
    ///
    /// A release with no matching press is ignored. Lock records replace an
    /// identical earlier record, so reporting the same lock state twice
    /// leaves the manager unchanged.
    pub fn push_back_active_modifier_flag(&mut self, flag: ActiveModifierFlag) {
        if flag.flag_type.is_decrease() {
            let paired = self.active_modifier_flags.iter().position(|f| f.is_paired(&flag));
            if let Some(index) = paired {
                self.active_modifier_flags.remove(index);
            } else {
                log::trace!("ignoring unpaired {:?} of {}", flag.flag_type, flag.modifier_flag);
            }
            return;
        }

        if flag.flag_type.is_lock() {
            self.active_modifier_flags.retain(|f| *f != flag);
        }
        self.active_modifier_flags.push(flag);
    }

    /// Drop every record for a device.
    pub fn erase_all_active_modifier_flags(&mut self, device_id: DeviceId) {
        self.active_modifier_flags.retain(|f| f.device_id != device_id);
    }

    /// Drop a device's key presses but keep its lock state.
    pub fn erase_all_active_modifier_flags_except_lock(&mut self, device_id: DeviceId) {
        self.active_modifier_flags
            .retain(|f| f.device_id != device_id || f.flag_type.is_lock());
    }

    pub fn reset(&mut self) {
        self.active_modifier_flags.clear();
    }

    /// Check if `modifier_flag` is held by any device.
    pub fn is_pressed(&self, modifier_flag: ModifierFlag) -> bool {
        let count: i32 = self
            .active_modifier_flags
            .iter()
            .filter(|f| f.modifier_flag == modifier_flag)
            .map(ActiveModifierFlag::count)
            .sum();
        count > 0
    }

    /// Every flag currently held.
    pub fn make_modifier_flags(&self) -> BTreeSet<ModifierFlag> {
        ModifierFlag::ALL
            .into_iter()
            .filter(|f| self.is_pressed(*f))
            .collect()
    }

    pub fn get_active_modifier_flags(&self) -> &[ActiveModifierFlag] {
        &self.active_modifier_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActiveModifierFlagType::*;

    const D1: DeviceId = DeviceId(1);
    const D2: DeviceId = DeviceId(2);

    fn flag(t: ActiveModifierFlagType, m: ModifierFlag, d: DeviceId) -> ActiveModifierFlag {
        ActiveModifierFlag::new(t, m, d)
    }

    #[test]
    fn test_increase_decrease() {
        let mut manager = ModifierFlagManager::new();
        assert!(!manager.is_pressed(ModifierFlag::LeftShift));

        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::LeftShift, D1));
        assert!(manager.is_pressed(ModifierFlag::LeftShift));
        assert!(!manager.is_pressed(ModifierFlag::RightShift));

        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::LeftShift, D2));
        manager.push_back_active_modifier_flag(flag(Decrease, ModifierFlag::LeftShift, D1));
        assert!(manager.is_pressed(ModifierFlag::LeftShift));

        manager.push_back_active_modifier_flag(flag(Decrease, ModifierFlag::LeftShift, D2));
        assert!(!manager.is_pressed(ModifierFlag::LeftShift));
        assert!(manager.get_active_modifier_flags().is_empty());
    }

    #[test]
    fn test_unpaired_decrease_is_ignored() {
        let mut manager = ModifierFlagManager::new();
        manager.push_back_active_modifier_flag(flag(Decrease, ModifierFlag::LeftControl, D1));
        assert!(manager.get_active_modifier_flags().is_empty());

        // A release from another device does not cancel this one.
        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::LeftControl, D1));
        manager.push_back_active_modifier_flag(flag(Decrease, ModifierFlag::LeftControl, D2));
        assert!(manager.is_pressed(ModifierFlag::LeftControl));
    }

    #[test]
    fn test_lock_is_idempotent() {
        let mut manager = ModifierFlagManager::new();
        manager.push_back_active_modifier_flag(flag(IncreaseLock, ModifierFlag::CapsLock, D1));
        assert!(manager.is_pressed(ModifierFlag::CapsLock));
        manager.push_back_active_modifier_flag(flag(IncreaseLock, ModifierFlag::CapsLock, D1));
        assert!(manager.is_pressed(ModifierFlag::CapsLock));
        assert_eq!(manager.get_active_modifier_flags().len(), 1);

        manager.push_back_active_modifier_flag(flag(DecreaseLock, ModifierFlag::CapsLock, D1));
        assert!(!manager.is_pressed(ModifierFlag::CapsLock));
        manager.push_back_active_modifier_flag(flag(DecreaseLock, ModifierFlag::CapsLock, D1));
        assert!(!manager.is_pressed(ModifierFlag::CapsLock));
        assert!(manager.get_active_modifier_flags().is_empty());
    }

    #[test]
    fn test_erase_all_active_modifier_flags() {
        let mut manager = ModifierFlagManager::new();
        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::LeftShift, D1));
        manager.push_back_active_modifier_flag(flag(IncreaseLock, ModifierFlag::CapsLock, D1));
        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::Fn, D2));

        manager.erase_all_active_modifier_flags_except_lock(D1);
        assert!(!manager.is_pressed(ModifierFlag::LeftShift));
        assert!(manager.is_pressed(ModifierFlag::CapsLock));
        assert!(manager.is_pressed(ModifierFlag::Fn));

        manager.erase_all_active_modifier_flags(D1);
        assert!(!manager.is_pressed(ModifierFlag::CapsLock));
        assert!(manager.is_pressed(ModifierFlag::Fn));

        manager.reset();
        assert!(manager.make_modifier_flags().is_empty());
    }

    #[test]
    fn test_make_modifier_flags() {
        let mut manager = ModifierFlagManager::new();
        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::RightCommand, D1));
        manager.push_back_active_modifier_flag(flag(Increase, ModifierFlag::LeftShift, D1));
        let flags: Vec<_> = manager.make_modifier_flags().into_iter().collect();
        assert_eq!(flags, vec![ModifierFlag::LeftShift, ModifierFlag::RightCommand]);
    }
}
