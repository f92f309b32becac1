//! State derived from the event stream: held modifiers and buttons.
//!
//! Both managers are owned by the [`EventQueue`](crate::EventQueue) and only
//! change as entries are appended to it. Manipulators read them.

mod modifier_flag_manager;
mod pointing_button_manager;

pub use modifier_flag_manager::{
    ActiveModifierFlag, ActiveModifierFlagType, ModifierFlagManager,
};
pub use pointing_button_manager::{
    ActivePointingButton, ActivePointingButtonType, PointingButtonManager,
};
