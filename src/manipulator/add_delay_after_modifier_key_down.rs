use super::Manipulate;
use crate::event::EventType;
use crate::event_queue::EventQueue;
use crate::types::{AbsoluteTime, DeviceId};
use std::time::Duration;

/// Extra delay added after each modifier key_down.
pub const MODIFIER_KEY_DOWN_DELAY: Duration = Duration::from_millis(1);

/// Spaces out modifier key_downs from whatever follows them.
///
/// Some applications sample the modifier state when a key event arrives and
/// miss a modifier posted in the same instant. Each modifier key_down is
/// replaced by a manipulated copy and the queue delay grows by
/// [`MODIFIER_KEY_DOWN_DELAY`], so later events land a little after it.
#[derive(Debug, Default)]
pub struct AddDelayAfterModifierKeyDown;

impl AddDelayAfterModifierKeyDown {
    pub fn new() -> Self {
        Self
    }
}

impl Manipulate for AddDelayAfterModifierKeyDown {
    fn manipulate(&mut self, queue: &mut EventQueue, _now: AbsoluteTime) {
        let mut i = 0;
        while i < queue.len() {
            let entry = &queue.get_entries()[i];
            let is_modifier_key_down = entry.is_manipulable()
                && entry.event_type() == EventType::KeyDown
                && entry.event().modifier_flag().is_some();
            if !is_modifier_key_down {
                i += 1;
                continue;
            }

            let copy = entry.clone();
            if let Some(e) = queue.entry_mut(i) {
                e.set_valid(false);
                e.set_manipulated(true);
            }
            queue.insert_manipulated_entry(i + 1, copy);
            queue.increase_time_stamp_delay(MODIFIER_KEY_DOWN_DELAY);
            i += 2;
        }
    }

    fn active(&self) -> bool {
        false
    }

    fn device_ungrabbed_callback(
        &mut self,
        _device_id: DeviceId,
        _queue: &mut EventQueue,
        _now: AbsoluteTime,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::types::KeyCode;

    fn push(queue: &mut EventQueue, ms: u64, key: KeyCode, event_type: EventType) {
        queue.emplace_back_event(
            DeviceId(1),
            AbsoluteTime::from_millis(ms),
            Event::KeyCode(key),
            event_type,
            Event::KeyCode(key),
        );
    }

    #[test]
    fn test_modifier_key_down_is_delayed() {
        let mut m = AddDelayAfterModifierKeyDown::new();
        let mut queue = EventQueue::new();
        push(&mut queue, 100, KeyCode::LEFT_SHIFT, EventType::KeyDown);

        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(queue.time_stamp_delay(), MODIFIER_KEY_DOWN_DELAY);

        let entries = queue.get_entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_valid());
        assert!(entries[1].is_valid() && entries[1].is_manipulated());
        assert_eq!(entries[1].event(), &Event::KeyCode(KeyCode::LEFT_SHIFT));
        // The copy itself is not delayed.
        assert_eq!(
            entries[1].event_time_stamp().time_stamp,
            AbsoluteTime::from_millis(100)
        );

        push(&mut queue, 100, KeyCode::A, EventType::KeyDown);
        let last = &queue.get_entries()[2];
        assert_eq!(
            last.event_time_stamp().time_stamp,
            AbsoluteTime::from_millis(100) + MODIFIER_KEY_DOWN_DELAY
        );
    }

    #[test]
    fn test_other_entries_untouched() {
        let mut m = AddDelayAfterModifierKeyDown::new();
        let mut queue = EventQueue::new();
        push(&mut queue, 100, KeyCode::A, EventType::KeyDown);
        push(&mut queue, 110, KeyCode::LEFT_SHIFT, EventType::KeyUp);

        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(queue.len(), 2);
        assert!(queue.get_entries().iter().all(|e| e.is_valid() && !e.is_manipulated()));
        assert_eq!(queue.time_stamp_delay(), Duration::ZERO);
        assert!(!m.active());
    }

    #[test]
    fn test_runs_once_per_key_down() {
        let mut m = AddDelayAfterModifierKeyDown::new();
        let mut queue = EventQueue::new();
        push(&mut queue, 100, KeyCode::LEFT_SHIFT, EventType::KeyDown);
        push(&mut queue, 100, KeyCode::LEFT_COMMAND, EventType::KeyDown);

        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.time_stamp_delay(), MODIFIER_KEY_DOWN_DELAY * 2);
        // The second copy was inserted after the first delay step.
        assert_eq!(
            queue.get_entries()[3].event_time_stamp().time_stamp,
            AbsoluteTime::from_millis(100) + MODIFIER_KEY_DOWN_DELAY
        );
    }
}
