//! Queue entries.

use crate::event::{Event, EventType};
use crate::types::{AbsoluteTime, DeviceId, duration_nanos};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When an entry happens, and how much artificial delay that includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventTimeStamp {
    /// Effective time stamp, delay included.
    pub time_stamp: AbsoluteTime,
    /// Delay the queue added to `time_stamp`.
    #[serde(with = "duration_nanos")]
    pub input_delay_duration: Duration,
}

impl EventTimeStamp {
    pub fn new(time_stamp: AbsoluteTime) -> Self {
        Self {
            time_stamp,
            input_delay_duration: Duration::ZERO,
        }
    }

    /// The time stamp as the device reported it.
    pub fn undelayed_time_stamp(&self) -> AbsoluteTime {
        AbsoluteTime::from_duration(
            self.time_stamp
                .as_duration()
                .saturating_sub(self.input_delay_duration),
        )
    }

    pub(crate) fn delay(&mut self, delay: Duration) {
        self.time_stamp += delay;
        self.input_delay_duration += delay;
    }
}

impl From<AbsoluteTime> for EventTimeStamp {
    fn from(time_stamp: AbsoluteTime) -> Self {
        EventTimeStamp::new(time_stamp)
    }
}

/// An event waiting in the queue, with its bookkeeping flags.
///
/// Equality compares every field, `lazy` included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    device_id: DeviceId,
    event_time_stamp: EventTimeStamp,
    valid: bool,
    lazy: bool,
    manipulated: bool,
    event: Event,
    event_type: EventType,
    original_event: Event,
}

impl Entry {
    /// Create a valid, non-lazy, unmanipulated entry.
    pub fn new(
        device_id: DeviceId,
        event_time_stamp: impl Into<EventTimeStamp>,
        event: Event,
        event_type: EventType,
        original_event: Event,
    ) -> Self {
        Self {
            device_id,
            event_time_stamp: event_time_stamp.into(),
            valid: true,
            lazy: false,
            manipulated: false,
            event,
            event_type,
            original_event,
        }
    }

    /// Builder-style variant of [`Entry::set_lazy`].
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn event_time_stamp(&self) -> &EventTimeStamp {
        &self.event_time_stamp
    }

    pub(crate) fn event_time_stamp_mut(&mut self) -> &mut EventTimeStamp {
        &mut self.event_time_stamp
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn original_event(&self) -> &Event {
        &self.original_event
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn set_valid(&mut self, value: bool) {
        self.valid = value;
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn set_lazy(&mut self, value: bool) {
        self.lazy = value;
    }

    pub fn is_manipulated(&self) -> bool {
        self.manipulated
    }

    pub fn set_manipulated(&mut self, value: bool) {
        self.manipulated = value;
    }

    /// Check if a manipulator may still rewrite this entry.
    pub fn is_manipulable(&self) -> bool {
        self.valid && !self.manipulated
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
