//! `from` and `to` event definitions.

use super::modifier_definition::FromModifiersDefinition;
use crate::event::Event;
use crate::types::{ConsumerKeyCode, KeyCode, ModifierFlag, PointingButton};
use serde::{Deserialize, Serialize};

/// Which family of events `"any"` matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnyType {
    KeyCode,
    ConsumerKeyCode,
    PointingButton,
}

/// The event a `from` definition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventDefinition {
    KeyCode(KeyCode),
    ConsumerKeyCode(ConsumerKeyCode),
    PointingButton(PointingButton),
    Any(AnyType),
}

impl EventDefinition {
    /// Check if `event` is what this definition names.
    pub fn test_event(&self, event: &Event) -> bool {
        match (self, event) {
            (EventDefinition::KeyCode(k), Event::KeyCode(e)) => k == e,
            (EventDefinition::ConsumerKeyCode(k), Event::ConsumerKeyCode(e)) => k == e,
            (EventDefinition::PointingButton(b), Event::PointingButton(e)) => b == e,
            (EventDefinition::Any(AnyType::KeyCode), Event::KeyCode(_)) => true,
            (EventDefinition::Any(AnyType::ConsumerKeyCode), Event::ConsumerKeyCode(_)) => true,
            (EventDefinition::Any(AnyType::PointingButton), Event::PointingButton(_)) => true,
            _ => false,
        }
    }
}

/// The `from` side of a basic manipulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromEventDefinition {
    pub event_definition: EventDefinition,
    pub modifiers: FromModifiersDefinition,
}

impl FromEventDefinition {
    pub fn new(event_definition: EventDefinition, modifiers: FromModifiersDefinition) -> Self {
        Self {
            event_definition,
            modifiers,
        }
    }

    pub fn test_event(&self, event: &Event) -> bool {
        self.event_definition.test_event(event)
    }
}

/// One output of a basic manipulator.
///
/// `modifiers` are pressed around the event, in order, and released in
/// reverse. With `lazy` set, those modifier events are marked lazy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToEventDefinition {
    pub event: Event,
    pub modifiers: Vec<ModifierFlag>,
    pub lazy: bool,
}

impl ToEventDefinition {
    pub fn new(event: impl Into<Event>) -> Self {
        Self {
            event: event.into(),
            modifiers: Vec::new(),
            lazy: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = ModifierFlag>) -> Self {
        self.modifiers = modifiers.into_iter().collect();
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Modifier key events, in press order.
    pub(crate) fn modifier_events(&self) -> impl DoubleEndedIterator<Item = Event> + '_ {
        self.modifiers.iter().map(|f| Event::KeyCode(KeyCode::from(*f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_definition() {
        let d = EventDefinition::KeyCode(KeyCode::A);
        assert!(d.test_event(&Event::KeyCode(KeyCode::A)));
        assert!(!d.test_event(&Event::KeyCode(KeyCode::B)));
        assert!(!d.test_event(&Event::PointingButton(PointingButton::BUTTON1)));

        let d = EventDefinition::PointingButton(PointingButton::BUTTON2);
        assert!(d.test_event(&Event::PointingButton(PointingButton::BUTTON2)));
        assert!(!d.test_event(&Event::PointingButton(PointingButton::BUTTON1)));

        let d = EventDefinition::Any(AnyType::ConsumerKeyCode);
        assert!(d.test_event(&Event::ConsumerKeyCode(ConsumerKeyCode::MUTE)));
        assert!(!d.test_event(&Event::KeyCode(KeyCode::A)));
        assert!(!d.test_event(&Event::CapsLockStateChanged(1)));
    }

    #[test]
    fn test_to_modifier_events() {
        let to = ToEventDefinition::new(KeyCode::A)
            .with_modifiers([ModifierFlag::LeftCommand, ModifierFlag::LeftShift]);
        let events: Vec<_> = to.modifier_events().collect();
        assert_eq!(
            events,
            vec![
                Event::KeyCode(KeyCode::LEFT_COMMAND),
                Event::KeyCode(KeyCode::LEFT_SHIFT)
            ]
        );
    }
}
