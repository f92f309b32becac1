//! HID usage pages and usages the core understands.

pub const USAGE_PAGE_GENERIC_DESKTOP: u32 = 0x01;
pub const USAGE_PAGE_KEYBOARD_OR_KEYPAD: u32 = 0x07;
pub const USAGE_PAGE_LEDS: u32 = 0x08;
pub const USAGE_PAGE_BUTTON: u32 = 0x09;
pub const USAGE_PAGE_CONSUMER: u32 = 0x0c;
pub const USAGE_PAGE_APPLE_VENDOR_TOP_CASE: u32 = 0xff;
pub const USAGE_PAGE_APPLE_VENDOR_KEYBOARD: u32 = 0xff01;

pub const USAGE_GD_X: u32 = 0x30;
pub const USAGE_GD_Y: u32 = 0x31;
pub const USAGE_GD_WHEEL: u32 = 0x38;
pub const USAGE_CONSUMER_AC_PAN: u32 = 0x238;
pub const USAGE_LED_CAPS_LOCK: u32 = 0x02;
