//! Conditions gating a manipulator on the host context.

use super::config::{ConditionConfig, DeviceIdentifierConfig, Polarity};
use crate::environment::ManipulatorEnvironment;
use crate::error::ConfigError;
use crate::event::InputSourceSelector;
use crate::event_queue::Entry;
use crate::types::{DeviceInfo, DeviceInfoLookup};
use regex::Regex;

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile(p)).collect()
}

fn resolve(polarity: Polarity, found: bool) -> bool {
    match polarity {
        Polarity::If => found,
        Polarity::Unless => !found,
    }
}

fn matches_optional(regex: &Option<Regex>, value: &Option<String>) -> bool {
    match (regex, value) {
        (Some(regex), Some(value)) => regex.is_match(value),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

/// An input source selector with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledInputSourceSelector {
    language: Option<Regex>,
    input_source_id: Option<Regex>,
    input_mode_id: Option<Regex>,
}

impl CompiledInputSourceSelector {
    fn new(selector: &InputSourceSelector) -> Result<Self, ConfigError> {
        let compile_opt = |p: &Option<String>| p.as_deref().map(compile).transpose();
        Ok(Self {
            language: compile_opt(&selector.language)?,
            input_source_id: compile_opt(&selector.input_source_id)?,
            input_mode_id: compile_opt(&selector.input_mode_id)?,
        })
    }

    fn test(&self, environment: &ManipulatorEnvironment) -> bool {
        let ids = environment.get_input_source_identifiers();
        matches_optional(&self.language, &ids.language)
            && matches_optional(&self.input_source_id, &ids.input_source_id)
            && matches_optional(&self.input_mode_id, &ids.input_mode_id)
    }
}

fn device_matches(identifier: &DeviceIdentifierConfig, info: &DeviceInfo) -> bool {
    identifier.vendor_id.is_none_or(|v| v == info.vendor_id)
        && identifier.product_id.is_none_or(|v| v == info.product_id)
        && identifier.is_keyboard.is_none_or(|v| v == info.is_keyboard)
        && identifier
            .is_pointing_device
            .is_none_or(|v| v == info.is_pointing_device)
}

/// A compiled condition.
#[derive(Debug, Clone)]
pub enum Condition {
    FrontmostApplication {
        polarity: Polarity,
        bundle_identifiers: Vec<Regex>,
        file_paths: Vec<Regex>,
    },
    Variable {
        polarity: Polarity,
        name: String,
        value: i64,
    },
    Device {
        polarity: Polarity,
        identifiers: Vec<DeviceIdentifierConfig>,
    },
    KeyboardType {
        polarity: Polarity,
        keyboard_types: Vec<String>,
    },
    InputSource {
        polarity: Polarity,
        input_sources: Vec<CompiledInputSourceSelector>,
    },
}

impl Condition {
    pub fn from_config(config: &ConditionConfig) -> Result<Self, ConfigError> {
        let condition = match config {
            ConditionConfig::FrontmostApplication(polarity, c) => Condition::FrontmostApplication {
                polarity: *polarity,
                bundle_identifiers: compile_all(&c.bundle_identifiers)?,
                file_paths: compile_all(&c.file_paths)?,
            },
            ConditionConfig::Variable(polarity, c) => Condition::Variable {
                polarity: *polarity,
                name: c.name.clone(),
                value: c.value,
            },
            ConditionConfig::Device(polarity, c) => Condition::Device {
                polarity: *polarity,
                identifiers: c
                    .identifiers
                    .iter()
                    .filter(|d| {
                        if d.is_empty() {
                            log::warn!("ignoring device identifier without any property");
                        }
                        !d.is_empty()
                    })
                    .cloned()
                    .collect(),
            },
            ConditionConfig::KeyboardType(polarity, c) => Condition::KeyboardType {
                polarity: *polarity,
                keyboard_types: c.keyboard_types.clone(),
            },
            ConditionConfig::InputSource(polarity, c) => Condition::InputSource {
                polarity: *polarity,
                input_sources: c
                    .input_sources
                    .iter()
                    .map(CompiledInputSourceSelector::new)
                    .collect::<Result<_, _>>()?,
            },
        };
        Ok(condition)
    }

    /// Check if `entry` may be manipulated in the current context.
    pub fn is_fulfilled(
        &self,
        entry: &Entry,
        environment: &ManipulatorEnvironment,
        devices: &dyn DeviceInfoLookup,
    ) -> bool {
        match self {
            Condition::FrontmostApplication {
                polarity,
                bundle_identifiers,
                file_paths,
            } => {
                let app = environment.get_frontmost_application();
                let found = bundle_identifiers
                    .iter()
                    .any(|r| r.is_match(&app.bundle_identifier))
                    || file_paths.iter().any(|r| r.is_match(&app.file_path));
                resolve(*polarity, found)
            }
            Condition::Variable {
                polarity,
                name,
                value,
            } => resolve(*polarity, environment.get_variable(name) == *value),
            Condition::Device {
                polarity,
                identifiers,
            } => {
                let found = devices
                    .device_info(entry.device_id())
                    .is_some_and(|info| identifiers.iter().any(|d| device_matches(d, &info)));
                resolve(*polarity, found)
            }
            Condition::KeyboardType {
                polarity,
                keyboard_types,
            } => {
                let current = environment.get_keyboard_type();
                resolve(*polarity, keyboard_types.iter().any(|t| t == current))
            }
            Condition::InputSource {
                polarity,
                input_sources,
            } => resolve(*polarity, input_sources.iter().any(|s| s.test(environment))),
        }
    }
}
