use super::{Manipulate, Manipulator, ManipulatorConfig};
use crate::error::ConfigError;
use crate::event::{Event, EventType};
use crate::event_queue::EventQueue;
use crate::types::{AbsoluteTime, DeviceId, DeviceInfoLookup};
use std::sync::Arc;

/// An ordered chain of manipulators.
///
/// Each cycle runs every manipulator once, in order, over the same queue.
/// Later manipulators see the entries earlier ones produced as manipulated
/// and leave them alone.
#[derive(Debug, Default)]
pub struct ManipulatorManager {
    manipulators: Vec<Manipulator>,
}

impl ManipulatorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chain from configuration, in order.
    pub fn from_configs(
        configs: &[ManipulatorConfig],
        devices: Arc<dyn DeviceInfoLookup>,
    ) -> Result<Self, ConfigError> {
        let manipulators = configs
            .iter()
            .map(|c| Manipulator::from_config(c, devices.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("manipulator chain built with {} manipulators", manipulators.len());
        Ok(Self { manipulators })
    }

    pub fn push_back_manipulator(&mut self, manipulator: impl Into<Manipulator>) {
        self.manipulators.push(manipulator.into());
    }

    pub fn get_manipulators(&self) -> &[Manipulator] {
        &self.manipulators
    }

    pub fn len(&self) -> usize {
        self.manipulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manipulators.is_empty()
    }

    /// Run every manipulator once.
    pub fn manipulate(&mut self, queue: &mut EventQueue, now: AbsoluteTime) {
        for m in &mut self.manipulators {
            m.manipulate(queue, now);
        }
    }

    /// Forget everything held for a disconnected device.
    ///
    /// Modifier flags (except locks) and pointing buttons of the device are
    /// cleared, every manipulator releases what it holds, and a
    /// `device_keys_and_pointing_buttons_are_released` event is appended.
    pub fn device_ungrabbed(
        &mut self,
        device_id: DeviceId,
        queue: &mut EventQueue,
        now: AbsoluteTime,
    ) {
        log::debug!("device {device_id} ungrabbed");

        queue.erase_all_active_modifier_flags_except_lock(device_id);
        queue.erase_all_active_pointing_buttons(device_id);

        for m in &mut self.manipulators {
            m.device_ungrabbed_callback(device_id, queue, now);
        }

        let event = Event::make_device_keys_and_pointing_buttons_are_released_event();
        queue.emplace_back_event(device_id, now, event.clone(), EventType::Single, event);
    }

    /// Check if any manipulator is waiting on a later event.
    pub fn active(&self) -> bool {
        self.manipulators.iter().any(|m| m.active())
    }
}
