//! Per-device pointing button state.

use crate::types::{DeviceId, PointingButton};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePointingButtonType {
    Increase,
    Decrease,
}

/// One press of a button by one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivePointingButton {
    #[serde(rename = "type")]
    pub button_type: ActivePointingButtonType,
    pub pointing_button: PointingButton,
    pub device_id: DeviceId,
}

impl ActivePointingButton {
    pub fn new(
        button_type: ActivePointingButtonType,
        pointing_button: PointingButton,
        device_id: DeviceId,
    ) -> Self {
        Self {
            button_type,
            pointing_button,
            device_id,
        }
    }
}

/// Tracks which pointing buttons are held, across all devices.
#[derive(Debug, Clone, Default)]
pub struct PointingButtonManager {
    active_pointing_buttons: Vec<ActivePointingButton>,
}

impl PointingButtonManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release. A release with no matching press is ignored.
    pub fn push_back_active_pointing_button(&mut self, button: ActivePointingButton) {
        match button.button_type {
            ActivePointingButtonType::Increase => self.active_pointing_buttons.push(button),
            ActivePointingButtonType::Decrease => {
                if let Some(index) = self.active_pointing_buttons.iter().position(|b| {
                    b.pointing_button == button.pointing_button && b.device_id == button.device_id
                }) {
                    self.active_pointing_buttons.remove(index);
                }
            }
        }
    }

    pub fn erase_all_active_pointing_buttons(&mut self, device_id: DeviceId) {
        self.active_pointing_buttons.retain(|b| b.device_id != device_id);
    }

    pub fn reset(&mut self) {
        self.active_pointing_buttons.clear();
    }

    pub fn is_pressed(&self, pointing_button: PointingButton) -> bool {
        self.active_pointing_buttons
            .iter()
            .any(|b| b.pointing_button == pointing_button)
    }

    /// Every button currently held.
    pub fn make_pointing_buttons(&self) -> BTreeSet<PointingButton> {
        self.active_pointing_buttons
            .iter()
            .map(|b| b.pointing_button)
            .collect()
    }

    pub fn get_active_pointing_buttons(&self) -> &[ActivePointingButton] {
        &self.active_pointing_buttons
    }
}
