//! The `from` → `to` remapper.

use super::Manipulate;
use super::conditions::Condition;
use super::event_definition::{FromEventDefinition, ToEventDefinition};
use crate::event::{Event, EventType};
use crate::event_queue::{Entry, EventQueue, EventTimeStamp};
use crate::types::{
    AbsoluteTime, DeviceId, DeviceInfoLookup, KeyCode, ModifierFlag, NoDeviceInfo,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long a key may be held and still count as tapped alone.
pub const DEFAULT_TO_IF_ALONE_TIMEOUT: Duration = Duration::from_millis(1000);

type Events = Vec<(Event, EventType, bool)>;

/// What a matched key_down decided, kept until its key_up.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ManipulatedOriginalEvent {
    from_flags: BTreeSet<ModifierFlag>,
    key_down_time_stamp: AbsoluteTime,
    /// Cleared once another key or button goes down, or the wheel moves.
    alone: bool,
}

/// Remaps one event to a sequence of events.
///
/// On a matching key_down the input entry is invalidated and the `to` events
/// are inserted right after it: every target but the last is tapped, the last
/// one is held. Modifiers required by `from` are released (lazily) before the
/// output so they do not leak into it. The decision is remembered per
/// `(device, original event)` and the matching key_up releases the held
/// target and restores those modifiers, whatever the modifier state is by
/// then.
///
/// On that key_up, `to_if_alone` is tapped if nothing else went down while
/// the key was held and it was released within the timeout. `to_after_key_up`
/// is tapped on every key_up.
pub struct BasicManipulator {
    from: Option<FromEventDefinition>,
    to: Vec<ToEventDefinition>,
    to_after_key_up: Vec<ToEventDefinition>,
    to_if_alone: Vec<ToEventDefinition>,
    to_if_alone_timeout: Duration,
    conditions: Vec<Condition>,
    devices: Arc<dyn DeviceInfoLookup>,
    manipulated_original_events: HashMap<(DeviceId, Event), ManipulatedOriginalEvent>,
}

impl BasicManipulator {
    pub fn new(from: FromEventDefinition, to: Vec<ToEventDefinition>) -> Self {
        Self {
            from: Some(from),
            to,
            to_after_key_up: Vec::new(),
            to_if_alone: Vec::new(),
            to_if_alone_timeout: DEFAULT_TO_IF_ALONE_TIMEOUT,
            conditions: Vec::new(),
            devices: Arc::new(NoDeviceInfo),
            manipulated_original_events: HashMap::new(),
        }
    }

    /// A manipulator whose `from` could not be resolved. It never matches.
    pub(crate) fn inert(to: Vec<ToEventDefinition>) -> Self {
        Self {
            from: None,
            to,
            to_after_key_up: Vec::new(),
            to_if_alone: Vec::new(),
            to_if_alone_timeout: DEFAULT_TO_IF_ALONE_TIMEOUT,
            conditions: Vec::new(),
            devices: Arc::new(NoDeviceInfo),
            manipulated_original_events: HashMap::new(),
        }
    }

    pub fn with_to_after_key_up(mut self, to_after_key_up: Vec<ToEventDefinition>) -> Self {
        self.to_after_key_up = to_after_key_up;
        self
    }

    pub fn with_to_if_alone(mut self, to_if_alone: Vec<ToEventDefinition>) -> Self {
        self.to_if_alone = to_if_alone;
        self
    }

    pub fn with_to_if_alone_timeout(mut self, timeout: Duration) -> Self {
        self.to_if_alone_timeout = timeout;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_device_info_lookup(mut self, devices: Arc<dyn DeviceInfoLookup>) -> Self {
        self.devices = devices;
        self
    }

    pub fn get_from(&self) -> Option<&FromEventDefinition> {
        self.from.as_ref()
    }

    pub fn get_to(&self) -> &[ToEventDefinition] {
        &self.to
    }

    pub fn get_to_after_key_up(&self) -> &[ToEventDefinition] {
        &self.to_after_key_up
    }

    pub fn get_to_if_alone(&self) -> &[ToEventDefinition] {
        &self.to_if_alone
    }

    pub fn get_to_if_alone_timeout(&self) -> Duration {
        self.to_if_alone_timeout
    }

    fn conditions_fulfilled(&self, entry: &Entry, queue: &EventQueue) -> bool {
        let environment = queue.get_manipulator_environment();
        self.conditions
            .iter()
            .all(|c| c.is_fulfilled(entry, environment, self.devices.as_ref()))
    }

    /// Events emitted when the input goes down, in order.
    fn key_down_events(&self, from_flags: &BTreeSet<ModifierFlag>) -> Events {
        let mut events = Vec::new();

        for flag in lifted(from_flags) {
            events.push((Event::KeyCode(KeyCode::from(flag)), EventType::KeyUp, true));
        }

        let Some((last, taps)) = self.to.split_last() else {
            return events;
        };

        tap_events(taps, &mut events);

        for m in last.modifier_events() {
            events.push((m, EventType::KeyDown, last.lazy));
        }
        events.push((last.event.clone(), EventType::KeyDown, false));

        events
    }

    /// Events releasing the held target.
    fn release_events(&self) -> Events {
        let mut events = Vec::new();
        if let Some(last) = self.to.last() {
            events.push((last.event.clone(), EventType::KeyUp, false));
            for m in last.modifier_events().rev() {
                events.push((m, EventType::KeyUp, last.lazy));
            }
        }
        events
    }

    fn insert_events(
        queue: &mut EventQueue,
        mut index: usize,
        source: &Entry,
        time_stamp: EventTimeStamp,
        events: Events,
    ) -> usize {
        for (event, event_type, lazy) in events {
            let entry = Entry::new(
                source.device_id(),
                time_stamp,
                event,
                event_type,
                source.original_event().clone(),
            )
            .with_lazy(lazy);
            index = queue.insert_manipulated_entry(index, entry) + 1;
        }
        index
    }
}

/// Modifiers to release while the output plays. Caps lock follows the LED
/// and cannot be released with a key event.
fn lifted(flags: &BTreeSet<ModifierFlag>) -> impl Iterator<Item = ModifierFlag> + '_ {
    flags.iter().copied().filter(|f| *f != ModifierFlag::CapsLock)
}

/// Press and release each target, with its modifiers around it.
fn tap_events(to: &[ToEventDefinition], events: &mut Events) {
    for to in to {
        for m in to.modifier_events() {
            events.push((m, EventType::KeyDown, to.lazy));
        }
        events.push((to.event.clone(), EventType::KeyDown, false));
        events.push((to.event.clone(), EventType::KeyUp, false));
        for m in to.modifier_events().rev() {
            events.push((m, EventType::KeyUp, to.lazy));
        }
    }
}

/// Clear `alone` on held keys other than `key` that are not `pending`.
fn unset_alone(
    records: &mut HashMap<(DeviceId, Event), ManipulatedOriginalEvent>,
    key: &(DeviceId, Event),
    pending: &HashSet<(DeviceId, Event)>,
) {
    for (k, record) in records.iter_mut() {
        if record.alone && k != key && !pending.contains(k) {
            log::trace!("{} is no longer alone", k.1.type_name());
            record.alone = false;
        }
    }
}

/// Input that means a held key was not pressed alone.
fn interrupts_alone(entry: &Entry) -> bool {
    match entry.event() {
        Event::KeyCode(_) | Event::ConsumerKeyCode(_) | Event::PointingButton(_) => {
            entry.event_type() == EventType::KeyDown
        }
        Event::PointingMotion(motion) => {
            motion.vertical_wheel != 0 || motion.horizontal_wheel != 0
        }
        _ => false,
    }
}

impl Manipulate for BasicManipulator {
    fn manipulate(&mut self, queue: &mut EventQueue, _now: AbsoluteTime) {
        let Some(from) = &self.from else {
            return;
        };

        // Held keys whose key_down is still queued, from an earlier pass.
        // Entries ahead of that key_down must not clear their `alone`.
        let mut pending: HashSet<(DeviceId, Event)> = queue
            .get_entries()
            .iter()
            .filter(|e| !e.is_valid() && e.event_type() == EventType::KeyDown)
            .map(|e| (e.device_id(), e.original_event().clone()))
            .filter(|key| self.manipulated_original_events.contains_key(key))
            .collect();

        let mut i = 0;
        while i < queue.len() {
            let entry = &queue.get_entries()[i];
            let key = (entry.device_id(), entry.original_event().clone());

            if entry.is_valid() {
                if interrupts_alone(entry) {
                    unset_alone(&mut self.manipulated_original_events, &key, &pending);
                }
            } else if entry.event_type() == EventType::KeyDown {
                pending.remove(&key);
            }

            if !entry.is_manipulable() || !from.test_event(entry.event()) {
                i += 1;
                continue;
            }

            match entry.event_type() {
                EventType::KeyDown => {
                    if !self.conditions_fulfilled(entry, queue) {
                        i += 1;
                        continue;
                    }
                    let modifier_flag_manager = queue.get_modifier_flag_manager();
                    let Some(from_flags) = from.modifiers.test_modifiers(modifier_flag_manager)
                    else {
                        i += 1;
                        continue;
                    };

                    let source = entry.clone();
                    log::debug!(
                        "manipulating {} key_down from {}",
                        source.event().type_name(),
                        source.device_id()
                    );

                    let events = self.key_down_events(&from_flags);
                    let record = ManipulatedOriginalEvent {
                        from_flags,
                        key_down_time_stamp: source.event_time_stamp().time_stamp,
                        alone: true,
                    };
                    self.manipulated_original_events.insert(key, record);
                    if let Some(e) = queue.entry_mut(i) {
                        e.set_valid(false);
                        e.set_manipulated(true);
                    }
                    let time_stamp = *source.event_time_stamp();
                    i = Self::insert_events(queue, i + 1, &source, time_stamp, events);
                }
                EventType::KeyUp => {
                    let Some(record) = self.manipulated_original_events.remove(&key) else {
                        i += 1;
                        continue;
                    };

                    let source = entry.clone();
                    log::debug!(
                        "manipulating {} key_up from {}",
                        source.event().type_name(),
                        source.device_id()
                    );

                    let mut events = self.release_events();

                    let key_up_time_stamp = source.event_time_stamp().time_stamp;
                    let held_for = key_up_time_stamp - record.key_down_time_stamp;
                    if record.alone && held_for < self.to_if_alone_timeout {
                        tap_events(&self.to_if_alone, &mut events);
                    }
                    tap_events(&self.to_after_key_up, &mut events);

                    // Restore only what is still physically held.
                    let modifier_flag_manager = queue.get_modifier_flag_manager();
                    for flag in lifted(&record.from_flags) {
                        if modifier_flag_manager.is_pressed(flag) {
                            let event = Event::KeyCode(KeyCode::from(flag));
                            events.push((event, EventType::KeyDown, true));
                        }
                    }

                    if let Some(e) = queue.entry_mut(i) {
                        e.set_valid(false);
                        e.set_manipulated(true);
                    }
                    let time_stamp = *source.event_time_stamp();
                    i = Self::insert_events(queue, i + 1, &source, time_stamp, events);
                }
                EventType::Single => i += 1,
            }
        }
    }

    fn active(&self) -> bool {
        !self.manipulated_original_events.is_empty()
    }

    fn device_ungrabbed_callback(
        &mut self,
        device_id: DeviceId,
        queue: &mut EventQueue,
        now: AbsoluteTime,
    ) {
        let keys: Vec<_> = self
            .manipulated_original_events
            .keys()
            .filter(|(d, _)| *d == device_id)
            .cloned()
            .collect();

        for key in keys {
            self.manipulated_original_events.remove(&key);
            let (_, original_event) = key;
            log::debug!(
                "releasing held output of {} on ungrab of {device_id}",
                original_event.type_name()
            );

            let source = Entry::new(
                device_id,
                now,
                original_event.clone(),
                EventType::KeyUp,
                original_event,
            );
            let end = queue.len();
            let events = self.release_events();
            Self::insert_events(queue, end, &source, EventTimeStamp::new(now), events);
        }
    }
}

impl fmt::Debug for BasicManipulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicManipulator")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("to_after_key_up", &self.to_after_key_up)
            .field("to_if_alone", &self.to_if_alone)
            .field("to_if_alone_timeout", &self.to_if_alone_timeout)
            .field("conditions", &self.conditions)
            .field("manipulated_original_events", &self.manipulated_original_events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulator::config::{ConditionConfig, Polarity, VariableConditionConfig};
    use crate::manipulator::event_definition::EventDefinition;
    use crate::manipulator::modifier_definition::{FromModifiersDefinition, ModifierDefinition};
    use crate::event::SetVariable;
    use crate::types::PointingButton;

    const DEVICE: DeviceId = DeviceId(1);

    fn key_from(
        key: KeyCode,
        mandatory: &[ModifierDefinition],
        optional: &[ModifierDefinition],
    ) -> FromEventDefinition {
        FromEventDefinition::new(
            EventDefinition::KeyCode(key),
            FromModifiersDefinition::new(mandatory.iter().copied(), optional.iter().copied()),
        )
    }

    fn push(queue: &mut EventQueue, ms: u64, event: Event, event_type: EventType) {
        let time_stamp = AbsoluteTime::from_millis(ms);
        queue.emplace_back_event(DEVICE, time_stamp, event.clone(), event_type, event);
    }

    /// The entries a consumer would post: valid ones, as (event, type, lazy).
    fn output(queue: &EventQueue) -> Vec<(Event, EventType, bool)> {
        queue
            .get_entries()
            .iter()
            .filter(|e| e.is_valid())
            .map(|e| (e.event().clone(), e.event_type(), e.is_lazy()))
            .collect()
    }

    fn drain(queue: &mut EventQueue) {
        while queue.erase_front_event().is_some() {}
    }

    fn k(key: KeyCode, event_type: EventType) -> (Event, EventType, bool) {
        (Event::KeyCode(key), event_type, false)
    }

    #[test]
    fn test_simple_remap() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::A, &[], &[]),
            vec![ToEventDefinition::new(KeyCode::B)],
        );
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::A), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::B, EventType::KeyDown)]);
        assert!(m.active());

        let entries = queue.get_entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_valid() && entries[0].is_manipulated());
        assert!(entries[1].is_manipulated());
        assert_eq!(entries[1].original_event(), &Event::KeyCode(KeyCode::A));
        drain(&mut queue);

        push(&mut queue, 200, Event::KeyCode(KeyCode::A), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::B, EventType::KeyUp)]);
        assert!(!m.active());
    }

    #[test]
    fn test_taps_and_hold() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::A, &[], &[]),
            vec![
                ToEventDefinition::new(KeyCode(0x06)),
                ToEventDefinition::new(KeyCode(0x07)),
                ToEventDefinition::new(KeyCode::ESCAPE),
            ],
        );
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::A), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode(0x06), EventType::KeyDown),
                k(KeyCode(0x06), EventType::KeyUp),
                k(KeyCode(0x07), EventType::KeyDown),
                k(KeyCode(0x07), EventType::KeyUp),
                k(KeyCode::ESCAPE, EventType::KeyDown),
            ]
        );
        drain(&mut queue);

        push(&mut queue, 200, Event::KeyCode(KeyCode::A), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::ESCAPE, EventType::KeyUp)]);
    }

    fn caps_lock_to_control() -> BasicManipulator {
        BasicManipulator::new(
            key_from(KeyCode::CAPS_LOCK, &[], &[ModifierDefinition::Any]),
            vec![ToEventDefinition::new(KeyCode::LEFT_CONTROL)],
        )
        .with_to_if_alone(vec![ToEventDefinition::new(KeyCode::ESCAPE)])
    }

    #[test]
    fn test_to_if_alone() {
        let mut m = caps_lock_to_control();
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::LEFT_CONTROL, EventType::KeyDown)]);
        drain(&mut queue);

        push(&mut queue, 200, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::LEFT_CONTROL, EventType::KeyUp),
                k(KeyCode::ESCAPE, EventType::KeyDown),
                k(KeyCode::ESCAPE, EventType::KeyUp),
            ]
        );
    }

    #[test]
    fn test_to_if_alone_after_another_key() {
        let mut m = caps_lock_to_control();
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        // control+a
        push(&mut queue, 150, Event::KeyCode(KeyCode::A), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);
        push(&mut queue, 160, Event::KeyCode(KeyCode::A), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        push(&mut queue, 200, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::LEFT_CONTROL, EventType::KeyUp)]);
    }

    #[test]
    fn test_to_if_alone_after_timeout() {
        let mut m = caps_lock_to_control();
        assert_eq!(m.get_to_if_alone_timeout(), DEFAULT_TO_IF_ALONE_TIMEOUT);
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        push(&mut queue, 1100, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::LEFT_CONTROL, EventType::KeyUp)]);

        // A shorter timeout can be configured.
        let mut m = caps_lock_to_control().with_to_if_alone_timeout(Duration::from_millis(50));
        drain(&mut queue);
        push(&mut queue, 2000, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);
        push(&mut queue, 2060, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(output(&queue), vec![k(KeyCode::LEFT_CONTROL, EventType::KeyUp)]);
    }

    #[test]
    fn test_to_if_alone_survives_repeated_passes() {
        let mut m = caps_lock_to_control();
        let mut queue = EventQueue::new();

        // Shift is already down when caps lock is pressed.
        push(&mut queue, 90, Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyDown);
        push(&mut queue, 100, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        push(&mut queue, 150, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::LEFT_CONTROL, EventType::KeyUp),
                k(KeyCode::ESCAPE, EventType::KeyDown),
                k(KeyCode::ESCAPE, EventType::KeyUp),
            ]
        );
    }

    #[test]
    fn test_to_after_key_up() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::SPACEBAR, &[ModifierDefinition::Shift], &[]),
            vec![ToEventDefinition::new(KeyCode::TAB)],
        )
        .with_to_after_key_up(vec![ToEventDefinition::new(KeyCode::ESCAPE)]);
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyDown);
        push(&mut queue, 110, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        // Escape plays while shift is still lifted, then shift comes back.
        push(&mut queue, 200, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::TAB, EventType::KeyUp),
                k(KeyCode::ESCAPE, EventType::KeyDown),
                k(KeyCode::ESCAPE, EventType::KeyUp),
                (Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyDown, true),
            ]
        );
        assert!(!m.active());
    }

    #[test]
    fn test_manipulate_is_idempotent() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::A, &[], &[]),
            vec![ToEventDefinition::new(KeyCode::B)],
        );
        let mut queue = EventQueue::new();
        push(&mut queue, 100, Event::KeyCode(KeyCode::A), EventType::KeyDown);

        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        let first: Vec<_> = queue.get_entries().to_vec();
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(queue.get_entries(), first.as_slice());
    }

    #[test]
    fn test_unmatched_key_up_passes_through() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::A, &[], &[]),
            vec![ToEventDefinition::new(KeyCode::B)],
        );
        let mut queue = EventQueue::new();
        push(&mut queue, 100, Event::KeyCode(KeyCode::A), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);

        assert_eq!(output(&queue), vec![k(KeyCode::A, EventType::KeyUp)]);
        assert!(!queue.get_entries()[0].is_manipulated());
    }

    #[test]
    fn test_mandatory_modifiers() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::SPACEBAR, &[ModifierDefinition::Shift], &[]),
            vec![ToEventDefinition::new(KeyCode::TAB)],
        );
        let mut queue = EventQueue::new();

        // Without shift nothing happens.
        push(&mut queue, 100, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert!(!m.active());
        drain(&mut queue);
        push(&mut queue, 110, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        // Shift and space in one report, space reported first.
        push(&mut queue, 200, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyDown);
        push(&mut queue, 200, Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::LEFT_SHIFT, EventType::KeyDown),
                (Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyUp, true),
                k(KeyCode::TAB, EventType::KeyDown),
            ]
        );
        drain(&mut queue);

        // Space released while shift is still held: shift comes back.
        push(&mut queue, 300, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::TAB, EventType::KeyUp),
                (Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyDown, true),
            ]
        );
        drain(&mut queue);
    }

    #[test]
    fn test_key_up_uses_recorded_decision() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::SPACEBAR, &[ModifierDefinition::Shift], &[]),
            vec![ToEventDefinition::new(KeyCode::TAB)],
        );
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyDown);
        push(&mut queue, 110, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);

        // Shift goes up first; the space key_up still closes tab.
        push(&mut queue, 200, Event::KeyCode(KeyCode::LEFT_SHIFT), EventType::KeyUp);
        push(&mut queue, 210, Event::KeyCode(KeyCode::SPACEBAR), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::LEFT_SHIFT, EventType::KeyUp),
                k(KeyCode::TAB, EventType::KeyUp),
            ]
        );
        assert!(!m.active());
    }

    #[test]
    fn test_to_modifiers_and_lazy() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::CAPS_LOCK, &[], &[ModifierDefinition::Any]),
            vec![
                ToEventDefinition::new(KeyCode::ESCAPE)
                    .with_modifiers([ModifierFlag::LeftCommand])
                    .with_lazy(true),
            ],
        );
        let mut queue = EventQueue::new();
        push(&mut queue, 100, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                (Event::KeyCode(KeyCode::LEFT_COMMAND), EventType::KeyDown, true),
                k(KeyCode::ESCAPE, EventType::KeyDown),
            ]
        );
        drain(&mut queue);

        push(&mut queue, 200, Event::KeyCode(KeyCode::CAPS_LOCK), EventType::KeyUp);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![
                k(KeyCode::ESCAPE, EventType::KeyUp),
                (Event::KeyCode(KeyCode::LEFT_COMMAND), EventType::KeyUp, true),
            ]
        );
    }

    #[test]
    fn test_pointing_button() {
        let mut m = BasicManipulator::new(
            FromEventDefinition::new(
                EventDefinition::PointingButton(PointingButton::BUTTON3),
                FromModifiersDefinition::default(),
            ),
            vec![ToEventDefinition::new(PointingButton::BUTTON1)],
        );
        let mut queue = EventQueue::new();
        let button3 = Event::PointingButton(PointingButton::BUTTON3);
        push(&mut queue, 100, button3, EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert_eq!(
            output(&queue),
            vec![(Event::PointingButton(PointingButton::BUTTON1), EventType::KeyDown, false)]
        );
    }

    #[test]
    fn test_conditions() {
        let condition = Condition::from_config(&ConditionConfig::Variable(
            Polarity::If,
            VariableConditionConfig {
                name: "vim_mode".into(),
                value: 1,
            },
        ))
        .unwrap();
        let mut m = BasicManipulator::new(
            key_from(KeyCode(0x0b), &[], &[]),
            vec![ToEventDefinition::new(KeyCode(0x50))],
        )
        .with_conditions(vec![condition]);
        let mut queue = EventQueue::new();

        push(&mut queue, 100, Event::KeyCode(KeyCode(0x0b)), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert!(!m.active());
        drain(&mut queue);

        let set = Event::SetVariable(SetVariable {
            name: "vim_mode".into(),
            value: 1,
        });
        push(&mut queue, 150, set, EventType::KeyDown);
        push(&mut queue, 200, Event::KeyCode(KeyCode(0x0b)), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        assert!(m.active());
    }

    #[test]
    fn test_device_ungrabbed_releases_held_output() {
        let mut m = BasicManipulator::new(
            key_from(KeyCode::A, &[], &[]),
            vec![ToEventDefinition::new(KeyCode::B)],
        );
        let mut queue = EventQueue::new();
        push(&mut queue, 100, Event::KeyCode(KeyCode::A), EventType::KeyDown);
        m.manipulate(&mut queue, AbsoluteTime::ZERO);
        drain(&mut queue);
        assert!(m.active());

        m.device_ungrabbed_callback(DeviceId(2), &mut queue, AbsoluteTime::from_millis(500));
        assert!(m.active());
        assert!(queue.empty());

        m.device_ungrabbed_callback(DEVICE, &mut queue, AbsoluteTime::from_millis(500));
        assert!(!m.active());
        assert_eq!(output(&queue), vec![k(KeyCode::B, EventType::KeyUp)]);
        assert_eq!(
            queue.get_entries()[0].event_time_stamp().time_stamp,
            AbsoluteTime::from_millis(500)
        );
    }
}
