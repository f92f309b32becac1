//! The event payload carried by every queue entry.
//!
//! [`Event`] is a closed set of variants. Each one converts to and from a JSON
//! object tagged by a `"type"` key, and [`Event::make_from_json`] is the exact
//! inverse of [`Event::to_json`]:
//!
//! ```
//! use kbremap::{Event, KeyCode};
//!
//! let event = Event::KeyCode(KeyCode::A);
//! let json = event.to_json();
//! assert_eq!(json, serde_json::json!({"type": "key_code", "key_code": "a"}));
//! assert_eq!(Event::make_from_json(&json), Some(event));
//! ```

use crate::types::{ConsumerKeyCode, KeyCode, ModifierFlag, PointingButton};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Whether an entry presses, releases, or is a one-shot occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A key or button went down.
    KeyDown,
    /// A key or button went up.
    KeyUp,
    /// Anything without a press/release pair (motion, notifications).
    Single,
}

/// Relative pointer movement and wheel deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointingMotion {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub vertical_wheel: i32,
    #[serde(default)]
    pub horizontal_wheel: i32,
}

impl PointingMotion {
    /// Check if every component is zero.
    pub fn is_zero(&self) -> bool {
        *self == PointingMotion::default()
    }
}

/// Identifies the active keyboard input source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSourceIdentifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode_id: Option<String>,
}

/// Regex patterns selecting an input source. Absent fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSourceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode_id: Option<String>,
}

/// The application that currently has focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontmostApplication {
    #[serde(default)]
    pub bundle_identifier: String,
    #[serde(default)]
    pub file_path: String,
}

/// A named integer variable set by a manipulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetVariable {
    pub name: String,
    #[serde(default)]
    pub value: i64,
}

/// An input event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    KeyCode(KeyCode),
    ConsumerKeyCode(ConsumerKeyCode),
    PointingButton(PointingButton),
    PointingMotion(PointingMotion),
    /// Caps lock LED state: 1 when on, 0 when off.
    CapsLockStateChanged(i64),
    ShellCommand(String),
    SelectInputSource(Vec<InputSourceSelector>),
    SetVariable(SetVariable),
    FrontmostApplicationChanged(FrontmostApplication),
    InputSourceChanged(InputSourceIdentifiers),
    KeyboardTypeChanged(String),
    /// Every key and button of a device must be treated as released.
    DeviceKeysAndPointingButtonsAreReleased,
}

impl Event {
    /// The event used to flush transient state for a device.
    pub fn make_device_keys_and_pointing_buttons_are_released_event() -> Event {
        Event::DeviceKeysAndPointingButtonsAreReleased
    }

    /// The `"type"` tag of this event.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::KeyCode(_) => "key_code",
            Event::ConsumerKeyCode(_) => "consumer_key_code",
            Event::PointingButton(_) => "pointing_button",
            Event::PointingMotion(_) => "pointing_motion",
            Event::CapsLockStateChanged(_) => "caps_lock_state_changed",
            Event::ShellCommand(_) => "shell_command",
            Event::SelectInputSource(_) => "select_input_source",
            Event::SetVariable(_) => "set_variable",
            Event::FrontmostApplicationChanged(_) => "frontmost_application_changed",
            Event::InputSourceChanged(_) => "input_source_changed",
            Event::KeyboardTypeChanged(_) => "keyboard_type_changed",
            Event::DeviceKeysAndPointingButtonsAreReleased => {
                "device_keys_and_pointing_buttons_are_released"
            }
        }
    }

    pub fn get_key_code(&self) -> Option<KeyCode> {
        match self {
            Event::KeyCode(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_consumer_key_code(&self) -> Option<ConsumerKeyCode> {
        match self {
            Event::ConsumerKeyCode(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_pointing_button(&self) -> Option<PointingButton> {
        match self {
            Event::PointingButton(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_pointing_motion(&self) -> Option<PointingMotion> {
        match self {
            Event::PointingMotion(v) => Some(*v),
            _ => None,
        }
    }

    /// Caps lock state for `caps_lock_state_changed` events.
    pub fn get_integer_value(&self) -> Option<i64> {
        match self {
            Event::CapsLockStateChanged(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_shell_command(&self) -> Option<&str> {
        match self {
            Event::ShellCommand(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_input_source_selectors(&self) -> Option<&[InputSourceSelector]> {
        match self {
            Event::SelectInputSource(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_set_variable(&self) -> Option<&SetVariable> {
        match self {
            Event::SetVariable(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_frontmost_application(&self) -> Option<&FrontmostApplication> {
        match self {
            Event::FrontmostApplicationChanged(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_input_source_identifiers(&self) -> Option<&InputSourceIdentifiers> {
        match self {
            Event::InputSourceChanged(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_keyboard_type(&self) -> Option<&str> {
        match self {
            Event::KeyboardTypeChanged(v) => Some(v),
            _ => None,
        }
    }

    /// The modifier flag driven by this event, if it is a modifier key.
    pub fn modifier_flag(&self) -> Option<ModifierFlag> {
        self.get_key_code().and_then(|k| k.modifier_flag())
    }

    /// Encode as a JSON object tagged by `"type"`.
    pub fn to_json(&self) -> Value {
        let mut json = Map::new();
        json.insert("type".into(), Value::from(self.type_name()));

        let payload = match self {
            Event::KeyCode(v) => Some(("key_code", serde_json::to_value(v))),
            Event::ConsumerKeyCode(v) => Some(("consumer_key_code", serde_json::to_value(v))),
            Event::PointingButton(v) => Some(("pointing_button", serde_json::to_value(v))),
            Event::PointingMotion(v) => Some(("pointing_motion", serde_json::to_value(v))),
            Event::CapsLockStateChanged(v) => Some(("integer_value", Ok(Value::from(*v)))),
            Event::ShellCommand(v) => Some(("shell_command", Ok(Value::from(v.as_str())))),
            Event::SelectInputSource(v) => {
                Some(("input_source_selectors", serde_json::to_value(v)))
            }
            Event::SetVariable(v) => Some(("set_variable", serde_json::to_value(v))),
            Event::FrontmostApplicationChanged(v) => {
                Some(("frontmost_application", serde_json::to_value(v)))
            }
            Event::InputSourceChanged(v) => {
                Some(("input_source_identifiers", serde_json::to_value(v)))
            }
            Event::KeyboardTypeChanged(v) => Some(("keyboard_type", Ok(Value::from(v.as_str())))),
            Event::DeviceKeysAndPointingButtonsAreReleased => None,
        };

        // Payload types serialize infallibly; an error would only drop the field.
        if let Some((key, Ok(value))) = payload {
            json.insert(key.into(), value);
        }

        Value::Object(json)
    }

    /// Decode an object produced by [`Event::to_json`].
    ///
    /// Returns `None` when `"type"` is missing or unknown, or when the variant's
    /// payload is missing or malformed.
    pub fn make_from_json(json: &Value) -> Option<Event> {
        let type_name = json.get("type")?.as_str()?;

        fn payload<T: serde::de::DeserializeOwned>(json: &Value, key: &str) -> Option<T> {
            serde_json::from_value(json.get(key)?.clone()).ok()
        }

        let event = match type_name {
            "key_code" => Event::KeyCode(payload(json, "key_code")?),
            "consumer_key_code" => Event::ConsumerKeyCode(payload(json, "consumer_key_code")?),
            "pointing_button" => Event::PointingButton(payload(json, "pointing_button")?),
            "pointing_motion" => Event::PointingMotion(payload(json, "pointing_motion")?),
            "caps_lock_state_changed" => {
                Event::CapsLockStateChanged(json.get("integer_value")?.as_i64()?)
            }
            "shell_command" => Event::ShellCommand(payload(json, "shell_command")?),
            "select_input_source" => {
                Event::SelectInputSource(payload(json, "input_source_selectors")?)
            }
            "set_variable" => Event::SetVariable(payload(json, "set_variable")?),
            "frontmost_application_changed" => {
                Event::FrontmostApplicationChanged(payload(json, "frontmost_application")?)
            }
            "input_source_changed" => {
                Event::InputSourceChanged(payload(json, "input_source_identifiers")?)
            }
            "keyboard_type_changed" => Event::KeyboardTypeChanged(payload(json, "keyboard_type")?),
            "device_keys_and_pointing_buttons_are_released" => {
                Event::DeviceKeysAndPointingButtonsAreReleased
            }
            _ => return None,
        };

        Some(event)
    }
}

impl From<KeyCode> for Event {
    fn from(v: KeyCode) -> Self {
        Event::KeyCode(v)
    }
}

impl From<ConsumerKeyCode> for Event {
    fn from(v: ConsumerKeyCode) -> Self {
        Event::ConsumerKeyCode(v)
    }
}

impl From<PointingButton> for Event {
    fn from(v: PointingButton) -> Self {
        Event::PointingButton(v)
    }
}

impl From<PointingMotion> for Event {
    fn from(v: PointingMotion) -> Self {
        Event::PointingMotion(v)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Value::deserialize(deserializer)?;
        Event::make_from_json(&json)
            .ok_or_else(|| de::Error::custom(format!("invalid event: {json}")))
    }
}
