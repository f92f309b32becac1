//! Concrete modifier flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete modifier role tracked by the modifier flag manager.
///
/// Unlike a modifier definition (`shift`), a flag is always sided
/// (`left_shift`). `caps_lock` follows the keyboard LED rather than the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierFlag {
    CapsLock,
    LeftControl,
    LeftShift,
    LeftOption,
    LeftCommand,
    RightControl,
    RightShift,
    RightOption,
    RightCommand,
    Fn,
}

impl ModifierFlag {
    /// Every flag, in declaration order.
    pub const ALL: [ModifierFlag; 10] = [
        ModifierFlag::CapsLock,
        ModifierFlag::LeftControl,
        ModifierFlag::LeftShift,
        ModifierFlag::LeftOption,
        ModifierFlag::LeftCommand,
        ModifierFlag::RightControl,
        ModifierFlag::RightShift,
        ModifierFlag::RightOption,
        ModifierFlag::RightCommand,
        ModifierFlag::Fn,
    ];

    /// The snake_case name used in configuration and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ModifierFlag::CapsLock => "caps_lock",
            ModifierFlag::LeftControl => "left_control",
            ModifierFlag::LeftShift => "left_shift",
            ModifierFlag::LeftOption => "left_option",
            ModifierFlag::LeftCommand => "left_command",
            ModifierFlag::RightControl => "right_control",
            ModifierFlag::RightShift => "right_shift",
            ModifierFlag::RightOption => "right_option",
            ModifierFlag::RightCommand => "right_command",
            ModifierFlag::Fn => "fn",
        }
    }
}

impl fmt::Display for ModifierFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
