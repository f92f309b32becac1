//! Value types shared by the event model, the queue and the manipulators.

mod consumer_key_code;
mod device;
pub mod hid;
mod key_code;
mod modifier_flag;
mod pointing_button;
mod time;

pub use consumer_key_code::ConsumerKeyCode;
pub use device::{DeviceId, DeviceInfo, DeviceInfoLookup, DeviceInfoMap, NoDeviceInfo};
pub use key_code::KeyCode;
pub use modifier_flag::ModifierFlag;
pub use pointing_button::PointingButton;
pub use time::AbsoluteTime;

pub(crate) use time::duration_nanos;
