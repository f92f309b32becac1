//! Matching `from.modifiers` against the held modifier flags.

use crate::state::ModifierFlagManager;
use crate::types::ModifierFlag;
use std::collections::BTreeSet;
use std::fmt;

/// A modifier as written in configuration.
///
/// Unsided names (`shift`) stand for either side. Declaration order is the
/// order definitions are tested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierDefinition {
    Any,
    Command,
    Control,
    Fn,
    LeftCommand,
    LeftControl,
    LeftOption,
    LeftShift,
    Option,
    RightCommand,
    RightControl,
    RightOption,
    RightShift,
    Shift,
}

const MODIFIER_DEFINITION_NAMES: &[(&str, ModifierDefinition)] = &[
    ("any", ModifierDefinition::Any),
    ("command", ModifierDefinition::Command),
    ("control", ModifierDefinition::Control),
    ("fn", ModifierDefinition::Fn),
    ("left_command", ModifierDefinition::LeftCommand),
    ("left_control", ModifierDefinition::LeftControl),
    ("left_option", ModifierDefinition::LeftOption),
    ("left_shift", ModifierDefinition::LeftShift),
    ("option", ModifierDefinition::Option),
    ("right_command", ModifierDefinition::RightCommand),
    ("right_control", ModifierDefinition::RightControl),
    ("right_option", ModifierDefinition::RightOption),
    ("right_shift", ModifierDefinition::RightShift),
    ("shift", ModifierDefinition::Shift),
];

impl ModifierDefinition {
    pub fn from_name(name: &str) -> Option<ModifierDefinition> {
        MODIFIER_DEFINITION_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, m)| *m)
    }

    pub fn name(&self) -> &'static str {
        MODIFIER_DEFINITION_NAMES
            .iter()
            .find(|(_, m)| m == self)
            .map(|(n, _)| *n)
            .unwrap_or("any")
    }

    /// Parse a list of names, dropping (and logging) the ones that are not
    /// modifiers.
    pub fn make_modifiers<S: AsRef<str>>(names: &[S]) -> BTreeSet<ModifierDefinition> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let m = ModifierDefinition::from_name(name);
                if m.is_none() {
                    log::warn!("unknown modifier `{name}` ignored");
                }
                m
            })
            .collect()
    }

    /// The concrete flags this definition accepts, in preference order.
    pub fn get_modifier_flags(&self) -> &'static [ModifierFlag] {
        match self {
            ModifierDefinition::Any => &[],
            ModifierDefinition::Command => &[ModifierFlag::LeftCommand, ModifierFlag::RightCommand],
            ModifierDefinition::Control => &[ModifierFlag::LeftControl, ModifierFlag::RightControl],
            ModifierDefinition::Fn => &[ModifierFlag::Fn],
            ModifierDefinition::LeftCommand => &[ModifierFlag::LeftCommand],
            ModifierDefinition::LeftControl => &[ModifierFlag::LeftControl],
            ModifierDefinition::LeftOption => &[ModifierFlag::LeftOption],
            ModifierDefinition::LeftShift => &[ModifierFlag::LeftShift],
            ModifierDefinition::Option => &[ModifierFlag::LeftOption, ModifierFlag::RightOption],
            ModifierDefinition::RightCommand => &[ModifierFlag::RightCommand],
            ModifierDefinition::RightControl => &[ModifierFlag::RightControl],
            ModifierDefinition::RightOption => &[ModifierFlag::RightOption],
            ModifierDefinition::RightShift => &[ModifierFlag::RightShift],
            ModifierDefinition::Shift => &[ModifierFlag::LeftShift, ModifierFlag::RightShift],
        }
    }

    /// The flag to press when this definition is used as an output modifier.
    /// Unsided definitions press the left key.
    pub fn output_flag(&self) -> Option<ModifierFlag> {
        self.get_modifier_flags().first().copied()
    }
}

impl fmt::Display for ModifierDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `mandatory` and `optional` modifier sets of a `from` definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FromModifiersDefinition {
    mandatory: BTreeSet<ModifierDefinition>,
    optional: BTreeSet<ModifierDefinition>,
}

impl FromModifiersDefinition {
    pub fn new(
        mandatory: impl IntoIterator<Item = ModifierDefinition>,
        optional: impl IntoIterator<Item = ModifierDefinition>,
    ) -> Self {
        Self {
            mandatory: mandatory.into_iter().collect(),
            optional: optional.into_iter().collect(),
        }
    }

    pub fn get_mandatory_modifiers(&self) -> &BTreeSet<ModifierDefinition> {
        &self.mandatory
    }

    pub fn get_optional_modifiers(&self) -> &BTreeSet<ModifierDefinition> {
        &self.optional
    }

    /// Resolve one definition against the held flags.
    ///
    /// Returns whether it matched and the first held flag that satisfied it.
    /// `any` always matches without naming a flag.
    pub fn test_modifier(
        manager: &ModifierFlagManager,
        modifier: ModifierDefinition,
    ) -> (bool, Option<ModifierFlag>) {
        if modifier == ModifierDefinition::Any {
            return (true, None);
        }
        match modifier
            .get_modifier_flags()
            .iter()
            .find(|f| manager.is_pressed(**f))
        {
            Some(flag) => (true, Some(*flag)),
            None => (false, None),
        }
    }

    /// Check the held flags against this definition.
    ///
    /// Returns the flags consumed by the mandatory definitions, or `None`
    /// when a mandatory definition is not held or a held flag is left
    /// unexplained. A held flag is explained when a mandatory match consumed
    /// it or an optional definition covers it; optional `any` explains
    /// everything. Mandatory `any` matches whatever is held and consumes it
    /// all.
    pub fn test_modifiers(&self, manager: &ModifierFlagManager) -> Option<BTreeSet<ModifierFlag>> {
        let pressed = manager.make_modifier_flags();

        if self.mandatory.contains(&ModifierDefinition::Any) {
            return Some(pressed);
        }

        let mut consumed = BTreeSet::new();
        for m in &self.mandatory {
            match Self::test_modifier(manager, *m) {
                (false, _) => return None,
                (true, Some(flag)) => {
                    consumed.insert(flag);
                }
                (true, None) => {}
            }
        }

        if !self.optional.contains(&ModifierDefinition::Any) {
            let covered: BTreeSet<ModifierFlag> = self
                .optional
                .iter()
                .flat_map(|m| m.get_modifier_flags().iter().copied())
                .collect();
            if pressed
                .iter()
                .any(|f| !consumed.contains(f) && !covered.contains(f))
            {
                return None;
            }
        }

        Some(consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActiveModifierFlag, ActiveModifierFlagType};
    use crate::types::DeviceId;
    use ModifierDefinition as M;

    fn press(flags: &[ModifierFlag]) -> ModifierFlagManager {
        let mut manager = ModifierFlagManager::new();
        for f in flags {
            let t = if *f == ModifierFlag::CapsLock {
                ActiveModifierFlagType::IncreaseLock
            } else {
                ActiveModifierFlagType::Increase
            };
            manager.push_back_active_modifier_flag(ActiveModifierFlag::new(t, *f, DeviceId(1)));
        }
        manager
    }

    fn set(flags: &[ModifierFlag]) -> Option<BTreeSet<ModifierFlag>> {
        Some(flags.iter().copied().collect())
    }

    #[test]
    fn test_make_modifiers() {
        let modifiers =
            ModifierDefinition::make_modifiers(&["shift", "left_command", "hyper", "any"]);
        assert_eq!(
            modifiers.into_iter().collect::<Vec<_>>(),
            vec![M::Any, M::LeftCommand, M::Shift]
        );
        assert_eq!(ModifierDefinition::from_name("caps_lock"), None);
        assert_eq!(M::Option.name(), "option");
    }

    #[test]
    fn test_test_modifier() {
        let manager = press(&[ModifierFlag::RightShift]);
        assert_eq!(
            FromModifiersDefinition::test_modifier(&manager, M::Shift),
            (true, Some(ModifierFlag::RightShift))
        );
        assert_eq!(FromModifiersDefinition::test_modifier(&manager, M::LeftShift), (false, None));
        assert_eq!(FromModifiersDefinition::test_modifier(&manager, M::Any), (true, None));

        let manager = press(&[ModifierFlag::LeftShift, ModifierFlag::RightShift]);
        assert_eq!(
            FromModifiersDefinition::test_modifier(&manager, M::Shift),
            (true, Some(ModifierFlag::LeftShift))
        );
    }

    #[test]
    fn test_test_modifiers_table() {
        use ModifierFlag::*;

        struct Case {
            mandatory: Vec<ModifierDefinition>,
            optional: Vec<ModifierDefinition>,
            pressed: Vec<ModifierFlag>,
            expected: Option<BTreeSet<ModifierFlag>>,
        }

        let cases = vec![
            Case {
                mandatory: vec![M::Shift],
                optional: vec![],
                pressed: vec![LeftShift],
                expected: set(&[LeftShift]),
            },
            Case {
                mandatory: vec![M::Shift],
                optional: vec![],
                pressed: vec![LeftShift, RightShift],
                expected: None,
            },
            Case {
                mandatory: vec![M::Shift],
                optional: vec![M::Any],
                pressed: vec![LeftShift, RightShift],
                expected: set(&[LeftShift]),
            },
            Case {
                mandatory: vec![M::Shift],
                optional: vec![],
                pressed: vec![],
                expected: None,
            },
            Case {
                mandatory: vec![M::Shift],
                optional: vec![],
                pressed: vec![LeftShift, LeftControl],
                expected: None,
            },
            Case {
                mandatory: vec![M::Shift],
                optional: vec![M::Control],
                pressed: vec![LeftShift, RightControl],
                expected: set(&[LeftShift]),
            },
            Case {
                mandatory: vec![M::Shift, M::Command],
                optional: vec![],
                pressed: vec![RightShift, LeftCommand],
                expected: set(&[RightShift, LeftCommand]),
            },
            Case {
                mandatory: vec![M::LeftShift],
                optional: vec![],
                pressed: vec![RightShift],
                expected: None,
            },
            Case {
                mandatory: vec![M::Any],
                optional: vec![],
                pressed: vec![LeftOption, Fn],
                expected: set(&[LeftOption, Fn]),
            },
            Case {
                mandatory: vec![],
                optional: vec![],
                pressed: vec![],
                expected: set(&[]),
            },
            Case {
                mandatory: vec![],
                optional: vec![],
                pressed: vec![LeftShift],
                expected: None,
            },
            Case {
                mandatory: vec![],
                optional: vec![],
                pressed: vec![CapsLock],
                expected: None,
            },
            Case {
                mandatory: vec![],
                optional: vec![M::Any],
                pressed: vec![CapsLock, RightCommand],
                expected: set(&[]),
            },
        ];

        for (i, case) in cases.into_iter().enumerate() {
            let definition = FromModifiersDefinition::new(case.mandatory, case.optional);
            let manager = press(&case.pressed);
            assert_eq!(definition.test_modifiers(&manager), case.expected, "case {i}");
        }
    }

    #[test]
    fn test_output_flag() {
        assert_eq!(M::Command.output_flag(), Some(ModifierFlag::LeftCommand));
        assert_eq!(M::RightOption.output_flag(), Some(ModifierFlag::RightOption));
        assert_eq!(M::Any.output_flag(), None);
    }
}
