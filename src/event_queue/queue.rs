//! The ordered entry queue.

use super::entry::{Entry, EventTimeStamp};
use crate::environment::ManipulatorEnvironment;
use crate::event::{Event, EventType};
use crate::state::{
    ActiveModifierFlag, ActiveModifierFlagType, ActivePointingButton, ActivePointingButtonType,
    ModifierFlagManager, PointingButtonManager,
};
use crate::types::{AbsoluteTime, DeviceId, ModifierFlag};
use std::time::Duration;

/// Entries in retirement order, plus the state derived from them.
///
/// Every entry appended with [`emplace_back_event`](Self::emplace_back_event)
/// or [`push_back_entry`](Self::push_back_entry) updates the modifier flag
/// manager, the pointing button manager and the manipulator environment.
/// Entries inserted by manipulators through
/// [`insert_manipulated_entry`](Self::insert_manipulated_entry) do not, so the
/// managers always describe the physical input.
#[derive(Debug, Default)]
pub struct EventQueue {
    entries: Vec<Entry>,
    modifier_flag_manager: ModifierFlagManager,
    pointing_button_manager: PointingButtonManager,
    manipulator_environment: ManipulatorEnvironment,
    time_stamp_delay: Duration,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry built from its parts.
    pub fn emplace_back_event(
        &mut self,
        device_id: DeviceId,
        event_time_stamp: impl Into<EventTimeStamp>,
        event: Event,
        event_type: EventType,
        original_event: Event,
    ) {
        self.push_back_entry(Entry::new(
            device_id,
            event_time_stamp,
            event,
            event_type,
            original_event,
        ));
    }

    /// Append an existing entry, keeping its `valid`, `lazy` and `manipulated`
    /// flags. The current delay is added to its time stamp.
    pub fn push_back_entry(&mut self, mut entry: Entry) {
        entry.event_time_stamp_mut().delay(self.time_stamp_delay);
        self.update_state(&entry);
        self.entries.push(entry);
        self.sort_tail();
    }

    /// Insert a manipulator's output at `index` (clamped to the queue length).
    ///
    /// The entry is marked manipulated and re-timed as its undelayed time
    /// stamp plus the current delay, kept between the stamps of its new
    /// neighbours so retirement order stays non-decreasing in time. State
    /// managers are not touched. Returns the index the entry landed at.
    pub fn insert_manipulated_entry(&mut self, index: usize, mut entry: Entry) -> usize {
        let index = index.min(self.entries.len());

        let base = entry.event_time_stamp().undelayed_time_stamp();
        let mut time_stamp = base + self.time_stamp_delay;
        if let Some(next) = self.entries.get(index) {
            time_stamp = time_stamp.min(next.event_time_stamp().time_stamp);
        }
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.entries.get(i)) {
            time_stamp = time_stamp.max(prev.event_time_stamp().time_stamp);
        }
        if time_stamp != base + self.time_stamp_delay {
            log::trace!("clamped inserted {} to its neighbours", entry.event().type_name());
        }

        *entry.event_time_stamp_mut() = EventTimeStamp {
            time_stamp,
            input_delay_duration: time_stamp - base,
        };
        entry.set_manipulated(true);

        self.entries.insert(index, entry);
        index
    }

    /// Remove and return the earliest entry.
    ///
    /// The delay accumulator resets once the queue is empty.
    pub fn erase_front_event(&mut self) -> Option<Entry> {
        let front = if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        };
        if self.entries.is_empty() && !self.time_stamp_delay.is_zero() {
            log::trace!("queue drained, dropping {:?} of delay", self.time_stamp_delay);
            self.time_stamp_delay = Duration::ZERO;
        }
        front
    }

    /// Drop every entry and reset the delay. Manager state is kept.
    pub fn clear_events(&mut self) {
        self.entries.clear();
        self.time_stamp_delay = Duration::ZERO;
    }

    pub fn get_entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    pub fn front(&self) -> Option<&Entry> {
        self.entries.first()
    }

    pub fn empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest effective time stamp in the queue.
    pub fn min_event_time_stamp(&self) -> Option<AbsoluteTime> {
        self.entries
            .iter()
            .map(|e| e.event_time_stamp().time_stamp)
            .min()
    }

    pub fn get_modifier_flag_manager(&self) -> &ModifierFlagManager {
        &self.modifier_flag_manager
    }

    pub fn get_pointing_button_manager(&self) -> &PointingButtonManager {
        &self.pointing_button_manager
    }

    pub fn get_manipulator_environment(&self) -> &ManipulatorEnvironment {
        &self.manipulator_environment
    }

    pub fn erase_all_active_modifier_flags(&mut self, device_id: DeviceId) {
        self.modifier_flag_manager
            .erase_all_active_modifier_flags(device_id);
    }

    pub fn erase_all_active_modifier_flags_except_lock(&mut self, device_id: DeviceId) {
        self.modifier_flag_manager
            .erase_all_active_modifier_flags_except_lock(device_id);
    }

    pub fn erase_all_active_pointing_buttons(&mut self, device_id: DeviceId) {
        self.pointing_button_manager
            .erase_all_active_pointing_buttons(device_id);
    }

    pub fn time_stamp_delay(&self) -> Duration {
        self.time_stamp_delay
    }

    /// Delay every entry appended from now on by an extra `value`.
    pub fn increase_time_stamp_delay(&mut self, value: Duration) {
        self.time_stamp_delay += value;
        log::trace!("time stamp delay is now {:?}", self.time_stamp_delay);
    }

    /// Check if `v2`, queued right after `v1`, has to move in front of it.
    ///
    /// Hardware that reports a modifier and a key in one HID report does not
    /// guarantee the order of the two values. When both are key downs at the
    /// same instant, the modifier goes first so remappers see it held.
    pub fn needs_swap(v1: &Entry, v2: &Entry) -> bool {
        if v1.event_time_stamp().time_stamp != v2.event_time_stamp().time_stamp {
            return false;
        }
        if v1.event_type() != EventType::KeyDown || v2.event_type() != EventType::KeyDown {
            return false;
        }
        match (v1.event().get_key_code(), v2.event().get_key_code()) {
            (Some(k1), Some(k2)) => !k1.is_modifier() && k2.is_modifier(),
            _ => false,
        }
    }

    fn sort_tail(&mut self) {
        let mut i = self.entries.len().saturating_sub(1);
        while i > 0 && Self::needs_swap(&self.entries[i - 1], &self.entries[i]) {
            self.entries.swap(i - 1, i);
            i -= 1;
        }
        if i + 1 < self.entries.len() {
            log::trace!("reordered modifier key_down to index {i}");
        }
    }

    fn update_state(&mut self, entry: &Entry) {
        let device_id = entry.device_id();
        let event = entry.event();
        let event_type = entry.event_type();

        if let Some(modifier_flag) = event.modifier_flag() {
            let flag_type = match event_type {
                EventType::KeyDown => ActiveModifierFlagType::Increase,
                _ => ActiveModifierFlagType::Decrease,
            };
            self.modifier_flag_manager
                .push_back_active_modifier_flag(ActiveModifierFlag::new(
                    flag_type,
                    modifier_flag,
                    device_id,
                ));
        }

        if let Some(value) = event.get_integer_value() {
            let flag_type = if value != 0 {
                ActiveModifierFlagType::IncreaseLock
            } else {
                ActiveModifierFlagType::DecreaseLock
            };
            self.modifier_flag_manager
                .push_back_active_modifier_flag(ActiveModifierFlag::new(
                    flag_type,
                    ModifierFlag::CapsLock,
                    device_id,
                ));
        }

        if let Some(pointing_button) = event.get_pointing_button()
            && pointing_button.0 != 0
        {
            let button_type = match event_type {
                EventType::KeyDown => ActivePointingButtonType::Increase,
                _ => ActivePointingButtonType::Decrease,
            };
            self.pointing_button_manager
                .push_back_active_pointing_button(ActivePointingButton::new(
                    button_type,
                    pointing_button,
                    device_id,
                ));
        }

        if let Some(v) = event.get_frontmost_application() {
            self.manipulator_environment.set_frontmost_application(v.clone());
        }
        if let Some(v) = event.get_input_source_identifiers() {
            self.manipulator_environment.set_input_source_identifiers(v.clone());
        }
        if event_type == EventType::KeyDown
            && let Some(v) = event.get_set_variable()
        {
            self.manipulator_environment.set_variable(v.name.clone(), v.value);
        }
        if let Some(v) = event.get_keyboard_type() {
            self.manipulator_environment.set_keyboard_type(v);
        }
    }
}
