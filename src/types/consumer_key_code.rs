//! Consumer page (media) key codes.

use super::hid::USAGE_PAGE_CONSUMER;
use super::key_code::NamedCodeVisitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A key on the HID consumer page (0x0c).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerKeyCode(pub u32);

const CONSUMER_KEY_CODE_NAMES: &[(&str, u32)] = &[
    ("power", 0x30),
    ("display_brightness_increment", 0x6f),
    ("display_brightness_decrement", 0x70),
    ("fastforward", 0xb3),
    ("rewind", 0xb4),
    ("scan_next_track", 0xb5),
    ("scan_previous_track", 0xb6),
    ("eject", 0xb8),
    ("play_or_pause", 0xcd),
    ("mute", 0xe2),
    ("volume_increment", 0xe9),
    ("volume_decrement", 0xea),
    ("al_word_processor", 0x184),
    ("al_text_editor", 0x185),
    ("al_spreadsheet", 0x186),
    ("al_email_reader", 0x18a),
    ("al_calculator", 0x192),
    ("al_local_machine_browser", 0x194),
    ("al_internet_browser", 0x196),
    ("ac_search", 0x221),
    ("ac_home", 0x223),
    ("ac_back", 0x224),
    ("ac_forward", 0x225),
    ("ac_refresh", 0x227),
    ("ac_bookmarks", 0x22a),
    // Aliases
    ("volume_up", 0xe9),
    ("volume_down", 0xea),
];

impl ConsumerKeyCode {
    pub const MUTE: ConsumerKeyCode = ConsumerKeyCode(0xe2);
    pub const PLAY_OR_PAUSE: ConsumerKeyCode = ConsumerKeyCode(0xcd);
    pub const VOLUME_INCREMENT: ConsumerKeyCode = ConsumerKeyCode(0xe9);
    pub const VOLUME_DECREMENT: ConsumerKeyCode = ConsumerKeyCode(0xea);

    pub fn from_name(name: &str) -> Option<ConsumerKeyCode> {
        CONSUMER_KEY_CODE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| ConsumerKeyCode(*v))
    }

    pub fn name(&self) -> Option<&'static str> {
        CONSUMER_KEY_CODE_NAMES
            .iter()
            .find(|(_, v)| *v == self.0)
            .map(|(n, _)| *n)
    }

    /// Translate a HID usage into a consumer key code.
    pub fn from_hid_usage(usage_page: u32, usage: u32) -> Option<ConsumerKeyCode> {
        if usage_page != USAGE_PAGE_CONSUMER {
            return None;
        }
        // Pointing-device pan shares the page but is motion, not a key.
        if usage == super::hid::USAGE_CONSUMER_AC_PAN || usage == 0 {
            return None;
        }
        Some(ConsumerKeyCode(usage))
    }
}

impl fmt::Display for ConsumerKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "(number:{})", self.0),
        }
    }
}

impl Serialize for ConsumerKeyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_u32(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ConsumerKeyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NamedCodeVisitor {
            expecting: "a consumer_key_code name or number",
            lookup: ConsumerKeyCode::from_name,
            make: ConsumerKeyCode,
        })
    }
}
