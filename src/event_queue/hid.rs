//! Turning raw HID values into queue entries.

use super::entry::Entry;
use crate::event::{Event, EventType, PointingMotion};
use crate::types::hid::{
    USAGE_CONSUMER_AC_PAN, USAGE_GD_WHEEL, USAGE_GD_X, USAGE_GD_Y, USAGE_LED_CAPS_LOCK,
    USAGE_PAGE_CONSUMER, USAGE_PAGE_GENERIC_DESKTOP, USAGE_PAGE_LEDS,
};
use crate::types::{AbsoluteTime, ConsumerKeyCode, DeviceId, KeyCode, PointingButton};
use serde::{Deserialize, Serialize};

/// One value from a HID input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidValue {
    pub time_stamp: AbsoluteTime,
    pub usage_page: u32,
    pub usage: u32,
    pub integer_value: i64,
}

impl HidValue {
    pub fn new(time_stamp: AbsoluteTime, usage_page: u32, usage: u32, integer_value: i64) -> Self {
        Self {
            time_stamp,
            usage_page,
            usage,
            integer_value,
        }
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
    VerticalWheel,
    HorizontalWheel,
}

impl Axis {
    fn from_usage(usage_page: u32, usage: u32) -> Option<Axis> {
        match (usage_page, usage) {
            (USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_X) => Some(Axis::X),
            (USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_Y) => Some(Axis::Y),
            (USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_WHEEL) => Some(Axis::VerticalWheel),
            (USAGE_PAGE_CONSUMER, USAGE_CONSUMER_AC_PAN) => Some(Axis::HorizontalWheel),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PendingMotion {
    time_stamp: Option<AbsoluteTime>,
    x: Option<i32>,
    y: Option<i32>,
    vertical_wheel: Option<i32>,
    horizontal_wheel: Option<i32>,
}

impl PendingMotion {
    fn axis(&mut self, axis: Axis) -> &mut Option<i32> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::VerticalWheel => &mut self.vertical_wheel,
            Axis::HorizontalWheel => &mut self.horizontal_wheel,
        }
    }

    fn take(&mut self, device_id: DeviceId) -> Option<Entry> {
        let pending = std::mem::take(self);
        let time_stamp = pending.time_stamp?;
        let event = Event::PointingMotion(PointingMotion {
            x: pending.x.unwrap_or(0),
            y: pending.y.unwrap_or(0),
            vertical_wheel: pending.vertical_wheel.unwrap_or(0),
            horizontal_wheel: pending.horizontal_wheel.unwrap_or(0),
        });
        Some(Entry::new(
            device_id,
            time_stamp,
            event.clone(),
            EventType::Single,
            event,
        ))
    }
}

fn clamp_axis(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Convert the values of HID reports into entries.
///
/// Keys, consumer keys and buttons become key_down/key_up entries. The caps
/// lock LED becomes `caps_lock_state_changed`. Pointer axes arrive as
/// separate usages of one report and are merged into a single
/// `pointing_motion` entry; seeing an axis that is already pending starts a
/// new motion. Unrecognized usages are skipped.
pub fn make_entries(hid_values: &[HidValue], device_id: DeviceId) -> Vec<Entry> {
    let mut result = Vec::new();
    let mut motion = PendingMotion::default();

    for v in hid_values {
        let event_type = if v.integer_value != 0 {
            EventType::KeyDown
        } else {
            EventType::KeyUp
        };

        let key_event = KeyCode::from_hid_usage(v.usage_page, v.usage)
            .map(Event::KeyCode)
            .or_else(|| {
                ConsumerKeyCode::from_hid_usage(v.usage_page, v.usage).map(Event::ConsumerKeyCode)
            })
            .or_else(|| {
                PointingButton::from_hid_usage(v.usage_page, v.usage).map(Event::PointingButton)
            });

        if let Some(event) = key_event {
            result.push(Entry::new(device_id, v.time_stamp, event.clone(), event_type, event));
            continue;
        }

        if let Some(axis) = Axis::from_usage(v.usage_page, v.usage) {
            if motion.axis(axis).is_some()
                && let Some(entry) = motion.take(device_id)
            {
                result.push(entry);
            }
            *motion.axis(axis) = Some(clamp_axis(v.integer_value));
            motion.time_stamp = Some(v.time_stamp);
            continue;
        }

        if v.usage_page == USAGE_PAGE_LEDS && v.usage == USAGE_LED_CAPS_LOCK {
            let event = Event::CapsLockStateChanged(v.integer_value);
            result.push(Entry::new(
                device_id,
                v.time_stamp,
                event.clone(),
                EventType::Single,
                event,
            ));
        }
    }

    if let Some(entry) = motion.take(device_id) {
        result.push(entry);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hid::{USAGE_PAGE_BUTTON, USAGE_PAGE_KEYBOARD_OR_KEYPAD};

    const DEVICE: DeviceId = DeviceId(3);

    fn t(ms: u64) -> AbsoluteTime {
        AbsoluteTime::from_millis(ms)
    }

    #[test]
    fn test_keys_and_buttons() {
        let values = [
            HidValue::new(t(1), USAGE_PAGE_KEYBOARD_OR_KEYPAD, 0x04, 1),
            HidValue::new(t(2), USAGE_PAGE_KEYBOARD_OR_KEYPAD, 0x04, 0),
            HidValue::new(t(3), USAGE_PAGE_CONSUMER, 0xe2, 1),
            HidValue::new(t(4), USAGE_PAGE_BUTTON, 2, 1),
            HidValue::new(t(5), 0x42, 0x42, 1),
        ];
        let entries = make_entries(&values, DEVICE);
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].event(), &Event::KeyCode(KeyCode::A));
        assert_eq!(entries[0].event_type(), EventType::KeyDown);
        assert_eq!(entries[1].event_type(), EventType::KeyUp);
        assert_eq!(entries[2].event(), &Event::ConsumerKeyCode(ConsumerKeyCode::MUTE));
        assert_eq!(entries[3].event(), &Event::PointingButton(PointingButton::BUTTON2));
        assert!(entries.iter().all(|e| e.device_id() == DEVICE));
    }

    #[test]
    fn test_pointing_motion_is_merged() {
        let values = [
            HidValue::new(t(10), USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_X, 10),
            HidValue::new(t(10), USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_Y, -20),
            HidValue::new(t(10), USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_WHEEL, 1),
            HidValue::new(t(10), USAGE_PAGE_CONSUMER, USAGE_CONSUMER_AC_PAN, -1),
        ];
        let entries = make_entries(&values, DEVICE);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type(), EventType::Single);
        assert_eq!(
            entries[0].event().get_pointing_motion(),
            Some(PointingMotion {
                x: 10,
                y: -20,
                vertical_wheel: 1,
                horizontal_wheel: -1,
            })
        );
    }

    #[test]
    fn test_repeated_axis_starts_new_motion() {
        let values = [
            HidValue::new(t(10), USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_X, 1),
            HidValue::new(t(20), USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_X, 2),
            HidValue::new(t(20), USAGE_PAGE_GENERIC_DESKTOP, USAGE_GD_Y, 3),
        ];
        let entries = make_entries(&values, DEVICE);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].event().get_pointing_motion(),
            Some(PointingMotion { x: 1, ..Default::default() })
        );
        assert_eq!(entries[1].event_time_stamp().time_stamp, t(20));
        assert_eq!(
            entries[1].event().get_pointing_motion(),
            Some(PointingMotion { x: 2, y: 3, ..Default::default() })
        );
    }

    #[test]
    fn test_caps_lock_led() {
        let values = [HidValue::new(t(1), USAGE_PAGE_LEDS, USAGE_LED_CAPS_LOCK, 1)];
        let entries = make_entries(&values, DEVICE);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event(), &Event::CapsLockStateChanged(1));
        assert_eq!(entries[0].event_type(), EventType::Single);
    }
}
