//! Keyboard key codes.
//!
//! A [`KeyCode`] is the HID usage of a key on the keyboard/keypad usage page
//! (0x07). Keys that live on other pages on real hardware (`fn`, Apple vendor
//! keys, a few media keys) get virtual codes at or above [`KeyCode::EXTRA`].
//! Unknown values are carried through unchanged; they just never map to a
//! modifier or a name.

use super::hid::{
    USAGE_PAGE_APPLE_VENDOR_KEYBOARD, USAGE_PAGE_APPLE_VENDOR_TOP_CASE,
    USAGE_PAGE_KEYBOARD_OR_KEYPAD,
};
use super::modifier_flag::ModifierFlag;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

// Canonical name first; later entries with the same value are aliases.
const KEY_CODE_NAMES: &[(&str, u32)] = &[
    ("a", 0x04),
    ("b", 0x05),
    ("c", 0x06),
    ("d", 0x07),
    ("e", 0x08),
    ("f", 0x09),
    ("g", 0x0a),
    ("h", 0x0b),
    ("i", 0x0c),
    ("j", 0x0d),
    ("k", 0x0e),
    ("l", 0x0f),
    ("m", 0x10),
    ("n", 0x11),
    ("o", 0x12),
    ("p", 0x13),
    ("q", 0x14),
    ("r", 0x15),
    ("s", 0x16),
    ("t", 0x17),
    ("u", 0x18),
    ("v", 0x19),
    ("w", 0x1a),
    ("x", 0x1b),
    ("y", 0x1c),
    ("z", 0x1d),
    ("1", 0x1e),
    ("2", 0x1f),
    ("3", 0x20),
    ("4", 0x21),
    ("5", 0x22),
    ("6", 0x23),
    ("7", 0x24),
    ("8", 0x25),
    ("9", 0x26),
    ("0", 0x27),
    ("return_or_enter", 0x28),
    ("escape", 0x29),
    ("delete_or_backspace", 0x2a),
    ("tab", 0x2b),
    ("spacebar", 0x2c),
    ("hyphen", 0x2d),
    ("equal_sign", 0x2e),
    ("open_bracket", 0x2f),
    ("close_bracket", 0x30),
    ("backslash", 0x31),
    ("non_us_pound", 0x32),
    ("semicolon", 0x33),
    ("quote", 0x34),
    ("grave_accent_and_tilde", 0x35),
    ("comma", 0x36),
    ("period", 0x37),
    ("slash", 0x38),
    ("caps_lock", 0x39),
    ("f1", 0x3a),
    ("f2", 0x3b),
    ("f3", 0x3c),
    ("f4", 0x3d),
    ("f5", 0x3e),
    ("f6", 0x3f),
    ("f7", 0x40),
    ("f8", 0x41),
    ("f9", 0x42),
    ("f10", 0x43),
    ("f11", 0x44),
    ("f12", 0x45),
    ("print_screen", 0x46),
    ("scroll_lock", 0x47),
    ("pause", 0x48),
    ("insert", 0x49),
    ("home", 0x4a),
    ("page_up", 0x4b),
    ("delete_forward", 0x4c),
    ("end", 0x4d),
    ("page_down", 0x4e),
    ("right_arrow", 0x4f),
    ("left_arrow", 0x50),
    ("down_arrow", 0x51),
    ("up_arrow", 0x52),
    ("keypad_num_lock", 0x53),
    ("keypad_slash", 0x54),
    ("keypad_asterisk", 0x55),
    ("keypad_hyphen", 0x56),
    ("keypad_plus", 0x57),
    ("keypad_enter", 0x58),
    ("keypad_1", 0x59),
    ("keypad_2", 0x5a),
    ("keypad_3", 0x5b),
    ("keypad_4", 0x5c),
    ("keypad_5", 0x5d),
    ("keypad_6", 0x5e),
    ("keypad_7", 0x5f),
    ("keypad_8", 0x60),
    ("keypad_9", 0x61),
    ("keypad_0", 0x62),
    ("keypad_period", 0x63),
    ("non_us_backslash", 0x64),
    ("application", 0x65),
    ("power", 0x66),
    ("keypad_equal_sign", 0x67),
    ("f13", 0x68),
    ("f14", 0x69),
    ("f15", 0x6a),
    ("f16", 0x6b),
    ("f17", 0x6c),
    ("f18", 0x6d),
    ("f19", 0x6e),
    ("f20", 0x6f),
    ("f21", 0x70),
    ("f22", 0x71),
    ("f23", 0x72),
    ("f24", 0x73),
    ("execute", 0x74),
    ("help", 0x75),
    ("menu", 0x76),
    ("select", 0x77),
    ("stop", 0x78),
    ("again", 0x79),
    ("undo", 0x7a),
    ("cut", 0x7b),
    ("copy", 0x7c),
    ("paste", 0x7d),
    ("find", 0x7e),
    ("mute", 0x7f),
    ("volume_increment", 0x80),
    ("volume_decrement", 0x81),
    ("keypad_comma", 0x85),
    ("international1", 0x87),
    ("international2", 0x88),
    ("international3", 0x89),
    ("international4", 0x8a),
    ("international5", 0x8b),
    ("international6", 0x8c),
    ("international7", 0x8d),
    ("international8", 0x8e),
    ("international9", 0x8f),
    ("lang1", 0x90),
    ("lang2", 0x91),
    ("lang3", 0x92),
    ("lang4", 0x93),
    ("lang5", 0x94),
    ("lang6", 0x95),
    ("lang7", 0x96),
    ("lang8", 0x97),
    ("lang9", 0x98),
    ("left_control", 0xe0),
    ("left_shift", 0xe1),
    ("left_option", 0xe2),
    ("left_command", 0xe3),
    ("right_control", 0xe4),
    ("right_shift", 0xe5),
    ("right_option", 0xe6),
    ("right_command", 0xe7),
    // Virtual codes
    ("vk_none", KeyCode::EXTRA + 1),
    ("fn", KeyCode::EXTRA + 2),
    ("display_brightness_decrement", KeyCode::EXTRA + 3),
    ("display_brightness_increment", KeyCode::EXTRA + 4),
    ("mission_control", KeyCode::EXTRA + 5),
    ("launchpad", KeyCode::EXTRA + 6),
    ("dashboard", KeyCode::EXTRA + 7),
    ("illumination_decrement", KeyCode::EXTRA + 8),
    ("illumination_increment", KeyCode::EXTRA + 9),
    ("rewind", KeyCode::EXTRA + 10),
    ("play_or_pause", KeyCode::EXTRA + 11),
    ("fastforward", KeyCode::EXTRA + 12),
    ("eject", KeyCode::EXTRA + 13),
    // Aliases
    ("left_alt", 0xe2),
    ("left_gui", 0xe3),
    ("right_alt", 0xe6),
    ("right_gui", 0xe7),
    ("volume_up", 0x80),
    ("volume_down", 0x81),
    ("japanese_eisuu", 0x91),
    ("japanese_kana", 0x90),
    ("japanese_pc_nfer", 0x8b),
    ("japanese_pc_xfer", 0x8a),
    ("japanese_pc_katakana", 0x88),
];

impl KeyCode {
    /// First value that is not a keyboard/keypad page usage.
    pub const EXTRA: u32 = 0x10000;

    pub const A: KeyCode = KeyCode(0x04);
    pub const B: KeyCode = KeyCode(0x05);
    pub const ESCAPE: KeyCode = KeyCode(0x29);
    pub const TAB: KeyCode = KeyCode(0x2b);
    pub const SPACEBAR: KeyCode = KeyCode(0x2c);
    pub const CAPS_LOCK: KeyCode = KeyCode(0x39);
    pub const LEFT_CONTROL: KeyCode = KeyCode(0xe0);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0xe1);
    pub const LEFT_OPTION: KeyCode = KeyCode(0xe2);
    pub const LEFT_COMMAND: KeyCode = KeyCode(0xe3);
    pub const RIGHT_CONTROL: KeyCode = KeyCode(0xe4);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0xe5);
    pub const RIGHT_OPTION: KeyCode = KeyCode(0xe6);
    pub const RIGHT_COMMAND: KeyCode = KeyCode(0xe7);
    pub const FN: KeyCode = KeyCode(Self::EXTRA + 2);

    /// Look up a key by its configuration name (aliases included).
    pub fn from_name(name: &str) -> Option<KeyCode> {
        KEY_CODE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| KeyCode(*v))
    }

    /// The canonical name of this key, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        KEY_CODE_NAMES
            .iter()
            .find(|(_, v)| *v == self.0)
            .map(|(n, _)| *n)
    }

    /// The modifier flag this key drives, if it is a modifier key.
    ///
    /// `caps_lock` is deliberately absent: its state follows the keyboard LED
    /// (`caps_lock_state_changed`), not the key.
    pub fn modifier_flag(&self) -> Option<ModifierFlag> {
        match *self {
            KeyCode::LEFT_CONTROL => Some(ModifierFlag::LeftControl),
            KeyCode::LEFT_SHIFT => Some(ModifierFlag::LeftShift),
            KeyCode::LEFT_OPTION => Some(ModifierFlag::LeftOption),
            KeyCode::LEFT_COMMAND => Some(ModifierFlag::LeftCommand),
            KeyCode::RIGHT_CONTROL => Some(ModifierFlag::RightControl),
            KeyCode::RIGHT_SHIFT => Some(ModifierFlag::RightShift),
            KeyCode::RIGHT_OPTION => Some(ModifierFlag::RightOption),
            KeyCode::RIGHT_COMMAND => Some(ModifierFlag::RightCommand),
            KeyCode::FN => Some(ModifierFlag::Fn),
            _ => None,
        }
    }

    /// Check if this key drives a modifier flag.
    pub fn is_modifier(&self) -> bool {
        self.modifier_flag().is_some()
    }

    /// Translate a HID usage into a key code.
    pub fn from_hid_usage(usage_page: u32, usage: u32) -> Option<KeyCode> {
        match usage_page {
            USAGE_PAGE_KEYBOARD_OR_KEYPAD if usage > 0x03 && usage < 0xffff => Some(KeyCode(usage)),
            USAGE_PAGE_APPLE_VENDOR_TOP_CASE if usage == 0x03 => Some(KeyCode::FN),
            USAGE_PAGE_APPLE_VENDOR_KEYBOARD if usage == 0x03 => Some(KeyCode::FN),
            _ => None,
        }
    }
}

impl From<ModifierFlag> for KeyCode {
    fn from(flag: ModifierFlag) -> Self {
        match flag {
            ModifierFlag::CapsLock => KeyCode::CAPS_LOCK,
            ModifierFlag::LeftControl => KeyCode::LEFT_CONTROL,
            ModifierFlag::LeftShift => KeyCode::LEFT_SHIFT,
            ModifierFlag::LeftOption => KeyCode::LEFT_OPTION,
            ModifierFlag::LeftCommand => KeyCode::LEFT_COMMAND,
            ModifierFlag::RightControl => KeyCode::RIGHT_CONTROL,
            ModifierFlag::RightShift => KeyCode::RIGHT_SHIFT,
            ModifierFlag::RightOption => KeyCode::RIGHT_OPTION,
            ModifierFlag::RightCommand => KeyCode::RIGHT_COMMAND,
            ModifierFlag::Fn => KeyCode::FN,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "(number:{})", self.0),
        }
    }
}

impl Serialize for KeyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_u32(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for KeyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NamedCodeVisitor {
            expecting: "a key_code name or number",
            lookup: KeyCode::from_name,
            make: KeyCode,
        })
    }
}

/// Shared visitor for the `name or number` encoding used by every key vocabulary.
pub(crate) struct NamedCodeVisitor<T> {
    pub(crate) expecting: &'static str,
    pub(crate) lookup: fn(&str) -> Option<T>,
    pub(crate) make: fn(u32) -> T,
}

impl<'de, T> Visitor<'de> for NamedCodeVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        (self.lookup)(v).ok_or_else(|| E::custom(format!("unknown name `{v}`")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        u32::try_from(v)
            .map(self.make)
            .map_err(|_| E::custom(format!("code out of range: {v}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        u32::try_from(v)
            .map(self.make)
            .map_err(|_| E::custom(format!("code out of range: {v}")))
    }
}
