//! Pointing device buttons.

use super::hid::USAGE_PAGE_BUTTON;
use super::key_code::NamedCodeVisitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A pointing device button, numbered from 1 like the HID button page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointingButton(pub u32);

impl PointingButton {
    /// Highest button that has a `buttonN` name.
    pub const MAX_NAMED: u32 = 32;

    pub const BUTTON1: PointingButton = PointingButton(1);
    pub const BUTTON2: PointingButton = PointingButton(2);
    pub const BUTTON3: PointingButton = PointingButton(3);

    pub fn from_name(name: &str) -> Option<PointingButton> {
        let n: u32 = name.strip_prefix("button")?.parse().ok()?;
        (1..=Self::MAX_NAMED).contains(&n).then_some(PointingButton(n))
    }

    pub fn name(&self) -> Option<String> {
        (1..=Self::MAX_NAMED)
            .contains(&self.0)
            .then(|| format!("button{}", self.0))
    }

    pub fn from_hid_usage(usage_page: u32, usage: u32) -> Option<PointingButton> {
        (usage_page == USAGE_PAGE_BUTTON && usage > 0).then_some(PointingButton(usage))
    }
}

impl fmt::Display for PointingButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(&name),
            None => write!(f, "(number:{})", self.0),
        }
    }
}

impl Serialize for PointingButton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(&name),
            None => serializer.serialize_u32(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for PointingButton {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NamedCodeVisitor {
            expecting: "a pointing_button name or number",
            lookup: PointingButton::from_name,
            make: PointingButton,
        })
    }
}
