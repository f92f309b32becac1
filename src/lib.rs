//! # kbremap
//!
//! The event core of a keyboard remapper: a timestamped event queue and a
//! chain of manipulators that rewrite it.
//!
//! ## Features
//!
//! - Typed events (keys, consumer keys, pointing buttons and motion, and
//!   context changes) with a stable JSON encoding
//! - Modifier and pointing button tracking derived from the physical input
//! - Order correction for modifiers reported in the same HID report as a key
//! - `basic` remapping with modifier matching and conditions on the
//!   frontmost application, variables, devices, keyboard type and input source
//! - A processing thread with sync and tokio channel outputs
//!
//! ## Quick Start
//!
//! ```
//! use kbremap::{AbsoluteTime, DeviceId, Entry, Event, EventType, KeyCode, Processor};
//! use kbremap::manipulator::{ManipulatorManager, load_manipulators};
//! use kbremap::types::NoDeviceInfo;
//! use kbremap::pipeline::PipelineInput;
//! use std::sync::Arc;
//!
//! let configs = load_manipulators(r#"{
//!     "manipulators": [{
//!         "from": {"key_code": "caps_lock", "modifiers": {"optional": ["any"]}},
//!         "to": [{"key_code": "escape"}]
//!     }]
//! }"#).unwrap();
//! let manager = ManipulatorManager::from_configs(&configs, Arc::new(NoDeviceInfo)).unwrap();
//!
//! let mut processor = Processor::new(manager, |entry: Entry| {
//!     assert_eq!(entry.event(), &Event::KeyCode(KeyCode::ESCAPE));
//! });
//! processor.process(PipelineInput::Event {
//!     device_id: DeviceId(1),
//!     time_stamp: AbsoluteTime::now(),
//!     event: Event::KeyCode(KeyCode::CAPS_LOCK),
//!     event_type: EventType::KeyDown,
//! });
//! ```
//!
//! ## Architecture
//!
//! Everything runs on one thread. The device layer appends the entries of
//! one report to the [`EventQueue`], which records the modifier and button
//! state they imply. The [`manipulator`] chain then rewrites the queue in
//! place: a rewritten entry is marked invalid and its replacements are
//! inserted after it, marked manipulated so no later stage touches them.
//! Finally every entry is retired front to back and the valid ones are
//! posted. See [`pipeline`] for the thread that drives this loop.

pub mod environment;
pub mod error;
pub mod event;
pub mod event_queue;
pub mod manipulator;
pub mod pipeline;
pub mod state;
pub mod types;

// Re-exports
pub use environment::ManipulatorEnvironment;
pub use error::{ConfigError, Error, Result};
pub use event::{Event, EventType};
pub use event_queue::{Entry, EventQueue, EventTimeStamp, HidValue, make_entries};
pub use manipulator::{
    Manipulate, Manipulator, ManipulatorConfig, ManipulatorManager, load_manipulators,
};
pub use pipeline::{
    InputSender, OutputHandler, Pipeline, PipelineInput, Processor, pipeline_channel,
};
#[cfg(feature = "tokio")]
pub use pipeline::pipeline_async_channel;
pub use state::{ModifierFlagManager, PointingButtonManager};
pub use types::{
    AbsoluteTime, ConsumerKeyCode, DeviceId, DeviceInfo, DeviceInfoLookup, KeyCode, ModifierFlag,
    PointingButton,
};
