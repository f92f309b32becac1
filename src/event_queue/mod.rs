//! The timestamped entry queue that manipulators operate on.
//!
//! The host drives the queue in one cycle per input:
//!
//! 1. append the device's entries ([`EventQueue::emplace_back_event`]),
//! 2. run the manipulator chain over it,
//! 3. retire every entry with [`EventQueue::erase_front_event`].
//!
//! Retiring everything each cycle means manipulators never rescan entries
//! from an earlier input. [`Processor`](crate::Processor) implements this loop.

mod entry;
mod hid;
mod queue;

pub use entry::{Entry, EventTimeStamp};
pub use hid::{HidValue, make_entries};
pub use queue::EventQueue;
