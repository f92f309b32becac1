//! Manipulators: the rewriting stages of the pipeline.
//!
//! A manipulator scans the [`EventQueue`] and rewrites it in place. It only
//! touches entries that are still manipulable (valid and not yet rewritten),
//! so running it twice over the same queue changes nothing the second time.

mod add_delay_after_modifier_key_down;
mod basic;
mod conditions;
pub mod config;
mod event_definition;
mod manager;
mod modifier_definition;

pub use add_delay_after_modifier_key_down::{
    AddDelayAfterModifierKeyDown, MODIFIER_KEY_DOWN_DELAY,
};
pub use basic::{BasicManipulator, DEFAULT_TO_IF_ALONE_TIMEOUT};
pub use conditions::{CompiledInputSourceSelector, Condition};
pub use config::{
    BasicConfig, BasicParameters, ConditionConfig, ManipulatorConfig, load_manipulators,
};
pub use event_definition::{AnyType, EventDefinition, FromEventDefinition, ToEventDefinition};
pub use manager::ManipulatorManager;
pub use modifier_definition::{FromModifiersDefinition, ModifierDefinition};

use crate::error::ConfigError;
use crate::event_queue::EventQueue;
use crate::types::{AbsoluteTime, DeviceId, DeviceInfoLookup};
use std::sync::Arc;
use std::time::Duration;

/// A stage that rewrites the event queue.
///
/// `now` is the time of the current processing cycle; manipulators use it
/// for entries they create without an input to copy the time from.
pub trait Manipulate: Send {
    /// Rewrite the manipulable entries of `queue`.
    fn manipulate(&mut self, queue: &mut EventQueue, now: AbsoluteTime);

    /// Check if the manipulator holds state that a later event will resolve,
    /// such as a remapped key that is still down.
    fn active(&self) -> bool;

    /// Release whatever the manipulator holds for `device_id`.
    fn device_ungrabbed_callback(
        &mut self,
        device_id: DeviceId,
        queue: &mut EventQueue,
        now: AbsoluteTime,
    );
}

/// Any manipulator the chain can hold.
pub enum Manipulator {
    Basic(BasicManipulator),
    AddDelayAfterModifierKeyDown(AddDelayAfterModifierKeyDown),
    /// A host-provided stage.
    External(Box<dyn Manipulate>),
}

impl Manipulator {
    /// Build a manipulator from its configuration.
    ///
    /// A `basic` manipulator whose `from` names nothing usable is built but
    /// never matches.
    pub fn from_config(
        config: &ManipulatorConfig,
        devices: Arc<dyn DeviceInfoLookup>,
    ) -> Result<Self, ConfigError> {
        match config {
            ManipulatorConfig::Basic(basic) => {
                fn definitions(list: &[config::ToConfig]) -> Vec<ToEventDefinition> {
                    list.iter().filter_map(|t| t.to_definition()).collect()
                }
                let to = definitions(&basic.to);
                let conditions = basic
                    .conditions
                    .iter()
                    .map(Condition::from_config)
                    .collect::<Result<Vec<_>, _>>()?;

                let manipulator = match basic.from.to_definition() {
                    Some(from) => BasicManipulator::new(from, to),
                    None => {
                        log::warn!(
                            "manipulator {:?} has no usable `from`, it will never match",
                            basic.description.as_deref().unwrap_or("")
                        );
                        BasicManipulator::inert(to)
                    }
                };
                let timeout = basic.parameters.to_if_alone_timeout_milliseconds;
                Ok(Manipulator::Basic(
                    manipulator
                        .with_to_after_key_up(definitions(&basic.to_after_key_up))
                        .with_to_if_alone(definitions(&basic.to_if_alone))
                        .with_to_if_alone_timeout(Duration::from_millis(timeout))
                        .with_conditions(conditions)
                        .with_device_info_lookup(devices),
                ))
            }
            ManipulatorConfig::AddDelayAfterModifierKeyDown => Ok(
                Manipulator::AddDelayAfterModifierKeyDown(AddDelayAfterModifierKeyDown::new()),
            ),
        }
    }
}

impl Manipulate for Manipulator {
    fn manipulate(&mut self, queue: &mut EventQueue, now: AbsoluteTime) {
        match self {
            Manipulator::Basic(m) => m.manipulate(queue, now),
            Manipulator::AddDelayAfterModifierKeyDown(m) => m.manipulate(queue, now),
            Manipulator::External(m) => m.manipulate(queue, now),
        }
    }

    fn active(&self) -> bool {
        match self {
            Manipulator::Basic(m) => m.active(),
            Manipulator::AddDelayAfterModifierKeyDown(m) => m.active(),
            Manipulator::External(m) => m.active(),
        }
    }

    fn device_ungrabbed_callback(
        &mut self,
        device_id: DeviceId,
        queue: &mut EventQueue,
        now: AbsoluteTime,
    ) {
        match self {
            Manipulator::Basic(m) => m.device_ungrabbed_callback(device_id, queue, now),
            Manipulator::AddDelayAfterModifierKeyDown(m) => {
                m.device_ungrabbed_callback(device_id, queue, now)
            }
            Manipulator::External(m) => m.device_ungrabbed_callback(device_id, queue, now),
        }
    }
}

impl From<BasicManipulator> for Manipulator {
    fn from(m: BasicManipulator) -> Self {
        Manipulator::Basic(m)
    }
}

impl From<AddDelayAfterModifierKeyDown> for Manipulator {
    fn from(m: AddDelayAfterModifierKeyDown) -> Self {
        Manipulator::AddDelayAfterModifierKeyDown(m)
    }
}

impl From<Box<dyn Manipulate>> for Manipulator {
    fn from(m: Box<dyn Manipulate>) -> Self {
        Manipulator::External(m)
    }
}

impl std::fmt::Debug for Manipulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Manipulator::Basic(m) => f.debug_tuple("Basic").field(m).finish(),
            Manipulator::AddDelayAfterModifierKeyDown(m) => {
                f.debug_tuple("AddDelayAfterModifierKeyDown").field(m).finish()
            }
            Manipulator::External(_) => f.write_str("External(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoDeviceInfo;
    use serde_json::json;

    fn build(value: serde_json::Value) -> Result<Manipulator, ConfigError> {
        Manipulator::from_config(&ManipulatorConfig::from_json(&value)?, Arc::new(NoDeviceInfo))
    }

    #[test]
    fn test_from_config() {
        let m = build(json!({
            "type": "basic",
            "from": {"key_code": "a"},
            "to": [{"key_code": "b"}]
        }))
        .unwrap();
        let Manipulator::Basic(basic) = m else {
            panic!("expected a basic manipulator");
        };
        assert!(basic.get_from().is_some());
        assert_eq!(basic.get_to().len(), 1);

        let m = build(json!({"type": "add_delay_after_modifier_key_down"})).unwrap();
        assert!(matches!(m, Manipulator::AddDelayAfterModifierKeyDown(_)));
    }

    #[test]
    fn test_from_config_key_up_targets() {
        let m = build(json!({
            "from": {"key_code": "caps_lock"},
            "to": [{"key_code": "left_control"}],
            "to_if_alone": [{"key_code": "escape"}],
            "to_after_key_up": [{"key_code": "not_a_key"}, {"key_code": "tab"}],
            "parameters": {"basic.to_if_alone_timeout_milliseconds": 300}
        }))
        .unwrap();
        let Manipulator::Basic(basic) = m else {
            panic!("expected a basic manipulator");
        };
        assert_eq!(basic.get_to_if_alone().len(), 1);
        assert_eq!(basic.get_to_after_key_up().len(), 1);
        assert_eq!(basic.get_to_if_alone_timeout(), Duration::from_millis(300));
    }

    #[test]
    fn test_unusable_from_never_matches() {
        let m = build(json!({
            "from": {"key_code": "not_a_key"},
            "to": [{"key_code": "b"}]
        }))
        .unwrap();
        let Manipulator::Basic(basic) = m else {
            panic!("expected a basic manipulator");
        };
        assert!(basic.get_from().is_none());
    }

    #[test]
    fn test_bad_condition_is_rejected() {
        let result = build(json!({
            "from": {"key_code": "a"},
            "conditions": [{"type": "variable_if", "name": "x", "value": "not a number"}]
        }));
        assert!(result.is_err());
    }
}
