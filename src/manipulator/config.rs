//! Manipulator configuration as read from JSON.
//!
//! Structural problems (a manipulator that is not an object, an unknown
//! manipulator or condition `type`, a field of the wrong JSON type) are
//! rejected with [`ConfigError`]. Unknown key names and modifier names are
//! dropped with a warning, so a typo disables one mapping instead of the
//! whole file.
//!
//! ```
//! use kbremap::manipulator::{ManipulatorConfig, load_manipulators};
//!
//! let configs = load_manipulators(r#"{
//!     "manipulators": [{
//!         "type": "basic",
//!         "from": {"key_code": "caps_lock", "modifiers": {"optional": ["any"]}},
//!         "to": [{"key_code": "left_control"}]
//!     }]
//! }"#).unwrap();
//! assert!(matches!(configs[0], ManipulatorConfig::Basic(_)));
//! ```

use super::event_definition::{
    AnyType, EventDefinition, FromEventDefinition, ToEventDefinition,
};
use super::modifier_definition::{FromModifiersDefinition, ModifierDefinition};
use crate::error::{ConfigError, Error, Result};
use crate::event::{Event, InputSourceSelector};
use crate::types::{ConsumerKeyCode, KeyCode, PointingButton};
use serde::de::{Deserializer, DeserializeOwned};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accept either a single string or an array, dropping non-string items.
fn string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                other => {
                    log::warn!("expected a string, ignoring {other}");
                    None
                }
            })
            .collect(),
        other => {
            log::warn!("expected a string or an array of strings, ignoring {other}");
            Vec::new()
        }
    };
    Ok(items)
}

fn from_field<T: DeserializeOwned>(
    json: &Value,
    field: &str,
) -> std::result::Result<T, ConfigError> {
    serde_json::from_value(json.clone()).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve a key name (or number) of one vocabulary, warning when unknown.
fn resolve_code<T: DeserializeOwned>(field: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("ignoring `{field}`: {e}");
            None
        }
    }
}

/// `from.modifiers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifiersConfig {
    #[serde(deserialize_with = "string_list")]
    pub mandatory: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub optional: Vec<String>,
}

impl ModifiersConfig {
    pub fn to_definition(&self) -> FromModifiersDefinition {
        FromModifiersDefinition::new(
            ModifierDefinition::make_modifiers(&self.mandatory),
            ModifierDefinition::make_modifiers(&self.optional),
        )
    }
}

/// The `from` object of a basic manipulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FromConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_key_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointing_button: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any: Option<String>,
    pub modifiers: ModifiersConfig,
}

impl FromConfig {
    /// The matching definition, or `None` if no usable event was named.
    pub fn to_definition(&self) -> Option<FromEventDefinition> {
        let event_definition = if let Some(v) = &self.key_code {
            resolve_code::<KeyCode>("key_code", v).map(EventDefinition::KeyCode)
        } else if let Some(v) = &self.consumer_key_code {
            resolve_code::<ConsumerKeyCode>("consumer_key_code", v)
                .map(EventDefinition::ConsumerKeyCode)
        } else if let Some(v) = &self.pointing_button {
            resolve_code::<PointingButton>("pointing_button", v)
                .map(EventDefinition::PointingButton)
        } else if let Some(any) = &self.any {
            match any.as_str() {
                "key_code" => Some(EventDefinition::Any(AnyType::KeyCode)),
                "consumer_key_code" => Some(EventDefinition::Any(AnyType::ConsumerKeyCode)),
                "pointing_button" => Some(EventDefinition::Any(AnyType::PointingButton)),
                other => {
                    log::warn!("ignoring unknown `any` type `{other}`");
                    None
                }
            }
        } else {
            None
        }?;

        Some(FromEventDefinition::new(event_definition, self.modifiers.to_definition()))
    }
}

/// One entry of a basic manipulator's `to` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_key_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointing_button: Option<Value>,
    #[serde(deserialize_with = "string_list")]
    pub modifiers: Vec<String>,
    pub lazy: bool,
}

impl ToConfig {
    pub fn to_definition(&self) -> Option<ToEventDefinition> {
        let event = if let Some(v) = &self.key_code {
            resolve_code::<KeyCode>("key_code", v).map(Event::KeyCode)
        } else if let Some(v) = &self.consumer_key_code {
            resolve_code::<ConsumerKeyCode>("consumer_key_code", v).map(Event::ConsumerKeyCode)
        } else if let Some(v) = &self.pointing_button {
            resolve_code::<PointingButton>("pointing_button", v).map(Event::PointingButton)
        } else {
            None
        }?;

        let modifiers = ModifierDefinition::make_modifiers(&self.modifiers)
            .into_iter()
            .filter_map(|m| m.output_flag());

        Some(
            ToEventDefinition::new(event)
                .with_modifiers(modifiers)
                .with_lazy(self.lazy),
        )
    }
}

/// Whether a condition requires or forbids its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    If,
    Unless,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontmostApplicationConditionConfig {
    #[serde(deserialize_with = "string_list")]
    pub bundle_identifiers: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub file_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableConditionConfig {
    pub name: String,
    pub value: i64,
}

/// Device properties to match; absent fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdentifierConfig {
    pub vendor_id: Option<u32>,
    pub product_id: Option<u32>,
    pub is_keyboard: Option<bool>,
    pub is_pointing_device: Option<bool>,
}

impl DeviceIdentifierConfig {
    pub fn is_empty(&self) -> bool {
        *self == DeviceIdentifierConfig::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConditionConfig {
    pub identifiers: Vec<DeviceIdentifierConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardTypeConditionConfig {
    #[serde(deserialize_with = "string_list")]
    pub keyboard_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSourceConditionConfig {
    pub input_sources: Vec<InputSourceSelector>,
}

/// One entry of a manipulator's `conditions` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionConfig {
    FrontmostApplication(Polarity, FrontmostApplicationConditionConfig),
    Variable(Polarity, VariableConditionConfig),
    Device(Polarity, DeviceConditionConfig),
    KeyboardType(Polarity, KeyboardTypeConditionConfig),
    InputSource(Polarity, InputSourceConditionConfig),
}

impl ConditionConfig {
    pub fn from_json(json: &Value) -> std::result::Result<Self, ConfigError> {
        if !json.is_object() {
            return Err(ConfigError::NotAnObject(json.to_string()));
        }
        let type_name = json
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "type".into(),
                reason: format!("condition needs a string `type`: {json}"),
            })?;

        let (base, polarity) = if let Some(base) = type_name.strip_suffix("_if") {
            (base, Polarity::If)
        } else if let Some(base) = type_name.strip_suffix("_unless") {
            (base, Polarity::Unless)
        } else {
            return Err(ConfigError::UnknownConditionType(type_name.to_string()));
        };

        let condition = match base {
            "frontmost_application" => {
                ConditionConfig::FrontmostApplication(polarity, from_field(json, type_name)?)
            }
            "variable" => ConditionConfig::Variable(polarity, from_field(json, type_name)?),
            "device" => ConditionConfig::Device(polarity, from_field(json, type_name)?),
            "keyboard_type" => {
                ConditionConfig::KeyboardType(polarity, from_field(json, type_name)?)
            }
            "input_source" => ConditionConfig::InputSource(polarity, from_field(json, type_name)?),
            _ => return Err(ConfigError::UnknownConditionType(type_name.to_string())),
        };

        Ok(condition)
    }
}

/// Parse a `to`-style field: absent, a single object or an array.
fn to_list(json: &Value, field: &str) -> std::result::Result<Vec<ToConfig>, ConfigError> {
    match json.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(|item| from_field(item, field)).collect(),
        Some(single) => Ok(vec![from_field(single, field)?]),
    }
}

/// Tunables of a basic manipulator, under `"parameters"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicParameters {
    #[serde(rename = "basic.to_if_alone_timeout_milliseconds")]
    pub to_if_alone_timeout_milliseconds: u64,
}

impl Default for BasicParameters {
    fn default() -> Self {
        Self {
            to_if_alone_timeout_milliseconds: 1000,
        }
    }
}

/// A `"type": "basic"` manipulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicConfig {
    pub description: Option<String>,
    pub from: FromConfig,
    pub to: Vec<ToConfig>,
    pub to_after_key_up: Vec<ToConfig>,
    pub to_if_alone: Vec<ToConfig>,
    pub parameters: BasicParameters,
    pub conditions: Vec<ConditionConfig>,
}

impl BasicConfig {
    fn from_json(json: &Value) -> std::result::Result<Self, ConfigError> {
        let mut config = BasicConfig {
            description: json
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Default::default()
        };

        if let Some(from) = json.get("from") {
            config.from = from_field(from, "from")?;
        }

        config.to = to_list(json, "to")?;
        config.to_after_key_up = to_list(json, "to_after_key_up")?;
        config.to_if_alone = to_list(json, "to_if_alone")?;

        if let Some(parameters) = json.get("parameters").filter(|p| !p.is_null()) {
            config.parameters = from_field(parameters, "parameters")?;
        }

        match json.get("conditions") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                config.conditions = items
                    .iter()
                    .map(ConditionConfig::from_json)
                    .collect::<std::result::Result<_, _>>()?;
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "conditions".into(),
                    reason: format!("expected an array, got {other}"),
                });
            }
        }

        Ok(config)
    }
}

/// A manipulator definition, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq)]
pub enum ManipulatorConfig {
    Basic(BasicConfig),
    AddDelayAfterModifierKeyDown,
}

impl ManipulatorConfig {
    pub fn from_json(json: &Value) -> std::result::Result<Self, ConfigError> {
        if !json.is_object() {
            return Err(ConfigError::NotAnObject(json.to_string()));
        }
        // A manipulator without a type is a basic one.
        let type_name = match json.get("type") {
            None => "basic",
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "type".into(),
                    reason: format!("expected a string, got {other}"),
                });
            }
        };

        match type_name {
            "basic" => Ok(ManipulatorConfig::Basic(BasicConfig::from_json(json)?)),
            "add_delay_after_modifier_key_down" => {
                Ok(ManipulatorConfig::AddDelayAfterModifierKeyDown)
            }
            other => Err(ConfigError::UnknownManipulatorType(other.to_string())),
        }
    }
}

/// Parse manipulator definitions.
///
/// Accepts a single manipulator object, an array of them, or an object with
/// a `"manipulators"` array.
pub fn load_manipulators(json: &str) -> Result<Vec<ManipulatorConfig>> {
    let value: Value = serde_json::from_str(json)?;
    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("manipulators") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "manipulators".into(),
                    reason: format!("expected an array, got {other}"),
                }));
            }
            None => std::slice::from_ref(&value),
        },
        other => return Err(Error::Config(ConfigError::NotAnObject(other.to_string()))),
    };

    let configs = items
        .iter()
        .map(ManipulatorConfig::from_json)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    log::debug!("loaded {} manipulator definitions", configs.len());
    Ok(configs)
}
