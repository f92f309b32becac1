//! Context that conditions are evaluated against.

use crate::event::{FrontmostApplication, InputSourceIdentifiers};
use serde::Serialize;
use std::collections::BTreeMap;

/// Host context accumulated from the notification events seen by the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManipulatorEnvironment {
    frontmost_application: FrontmostApplication,
    input_source_identifiers: InputSourceIdentifiers,
    variables: BTreeMap<String, i64>,
    keyboard_type: String,
}

impl ManipulatorEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_frontmost_application(&self) -> &FrontmostApplication {
        &self.frontmost_application
    }

    pub fn set_frontmost_application(&mut self, value: FrontmostApplication) {
        self.frontmost_application = value;
    }

    pub fn get_input_source_identifiers(&self) -> &InputSourceIdentifiers {
        &self.input_source_identifiers
    }

    pub fn set_input_source_identifiers(&mut self, value: InputSourceIdentifiers) {
        self.input_source_identifiers = value;
    }

    /// Value of a variable. Unset variables read as 0.
    pub fn get_variable(&self, name: &str) -> i64 {
        self.variables.get(name).copied().unwrap_or(0)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: i64) {
        self.variables.insert(name.into(), value);
    }

    pub fn get_keyboard_type(&self) -> &str {
        &self.keyboard_type
    }

    pub fn set_keyboard_type(&mut self, value: impl Into<String>) {
        self.keyboard_type = value.into();
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
