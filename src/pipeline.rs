//! The event-processing thread.
//!
//! [`Processor`] is the synchronous core: it appends one input to the
//! [`EventQueue`], runs the manipulator chain once and retires every entry
//! to an [`OutputHandler`]. [`Pipeline`] runs a processor on a dedicated
//! thread fed through a channel, so the queue is only ever touched from one
//! thread.
//!
//! # Example
//!
//! ```no_run
//! use kbremap::event::{Event, EventType};
//! use kbremap::manipulator::{ManipulatorManager, load_manipulators};
//! use kbremap::pipeline::{PipelineInput, pipeline_channel};
//! use kbremap::types::{AbsoluteTime, DeviceId, KeyCode, NoDeviceInfo};
//! use std::sync::Arc;
//!
//! let configs = load_manipulators(r#"[{"from": {"key_code": "a"}, "to": [{"key_code": "b"}]}]"#)
//!     .expect("valid configuration");
//! let manager = ManipulatorManager::from_configs(&configs, Arc::new(NoDeviceInfo))
//!     .expect("valid manipulators");
//!
//! let (pipeline, rx) = pipeline_channel(manager, 100).expect("failed to start pipeline");
//! pipeline
//!     .send(PipelineInput::Event {
//!         device_id: DeviceId(1),
//!         time_stamp: AbsoluteTime::now(),
//!         event: Event::KeyCode(KeyCode::A),
//!         event_type: EventType::KeyDown,
//!     })
//!     .expect("pipeline is running");
//!
//! for entry in rx.iter() {
//!     println!("{:?} {:?}", entry.event_type(), entry.event());
//! }
//! ```

use crate::error::{Error, Result};
use crate::event::{Event, EventType};
use crate::event_queue::{Entry, EventQueue, HidValue, make_entries};
use crate::manipulator::ManipulatorManager;
use crate::types::{AbsoluteTime, DeviceId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

/// Receives the entries that survive manipulation, in retirement order.
pub trait OutputHandler: Send {
    fn handle_entry(&mut self, entry: Entry);
}

/// Implement OutputHandler for closures.
impl<F> OutputHandler for F
where
    F: FnMut(Entry) + Send,
{
    fn handle_entry(&mut self, entry: Entry) {
        self(entry);
    }
}

/// One unit of work for the processor.
///
/// Everything in one input is appended before the chain runs, so all the
/// values of one device report must travel together.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineInput {
    /// A single physical event.
    Event {
        device_id: DeviceId,
        time_stamp: AbsoluteTime,
        event: Event,
        event_type: EventType,
    },
    /// Entries already built by the device layer.
    Entries(Vec<Entry>),
    /// The values of one HID report.
    HidValues {
        device_id: DeviceId,
        values: Vec<HidValue>,
    },
    /// The device was disconnected or released.
    DeviceUngrabbed {
        device_id: DeviceId,
        time_stamp: AbsoluteTime,
    },
}

/// Queue, manipulator chain and output, driven one input at a time.
pub struct Processor<H: OutputHandler> {
    queue: EventQueue,
    manager: ManipulatorManager,
    handler: H,
    held: Vec<Entry>,
}

impl<H: OutputHandler> Processor<H> {
    pub fn new(manager: ManipulatorManager, handler: H) -> Self {
        Self {
            queue: EventQueue::new(),
            manager,
            handler,
            held: Vec::new(),
        }
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn manager(&self) -> &ManipulatorManager {
        &self.manager
    }

    /// Lazy key downs waiting for a non-lazy entry.
    pub fn held_entries(&self) -> &[Entry] {
        &self.held
    }

    /// Append `input`, run the chain and retire the whole queue.
    pub fn process(&mut self, input: PipelineInput) {
        let now = match input {
            PipelineInput::Event {
                device_id,
                time_stamp,
                event,
                event_type,
            } => {
                self.queue
                    .emplace_back_event(device_id, time_stamp, event.clone(), event_type, event);
                time_stamp
            }
            PipelineInput::Entries(entries) => {
                for entry in entries {
                    self.queue.push_back_entry(entry);
                }
                AbsoluteTime::now()
            }
            PipelineInput::HidValues { device_id, values } => {
                for entry in make_entries(&values, device_id) {
                    self.queue.push_back_entry(entry);
                }
                AbsoluteTime::now()
            }
            PipelineInput::DeviceUngrabbed {
                device_id,
                time_stamp,
            } => {
                let before = self.held.len();
                self.held.retain(|e| e.device_id() != device_id);
                if self.held.len() != before {
                    let discarded = before - self.held.len();
                    log::debug!("discarded {discarded} held entries of {device_id}");
                }
                self.manager
                    .device_ungrabbed(device_id, &mut self.queue, time_stamp);
                time_stamp
            }
        };

        self.manager.manipulate(&mut self.queue, now);

        while let Some(entry) = self.queue.erase_front_event() {
            if entry.is_valid() {
                self.dispatch(entry);
            }
        }
    }

    /// Post every held entry.
    pub fn flush(&mut self) {
        for entry in std::mem::take(&mut self.held) {
            self.handler.handle_entry(entry);
        }
    }

    fn dispatch(&mut self, entry: Entry) {
        if entry.event_type() == EventType::KeyUp
            && let Some(i) = self
                .held
                .iter()
                .position(|h| h.device_id() == entry.device_id() && h.event() == entry.event())
        {
            log::trace!("{} key_up cancels a held key_down", entry.event().type_name());
            self.held.remove(i);
            return;
        }

        if entry.is_lazy() {
            if entry.event_type() == EventType::KeyDown {
                self.held.push(entry);
            } else {
                self.handler.handle_entry(entry);
            }
            return;
        }

        self.flush();
        self.handler.handle_entry(entry);
    }
}

enum Message {
    Input(PipelineInput),
    Flush,
    Stop,
}

/// Cloneable handle that feeds a running [`Pipeline`].
///
/// Sending after the pipeline stopped fails with [`Error::NotRunning`]. If
/// the thread died without stopping, the error is [`Error::ChannelClosed`].
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<Message>,
    running: Arc<AtomicBool>,
}

impl InputSender {
    pub fn send(&self, input: PipelineInput) -> Result<()> {
        self.send_message(Message::Input(input))
    }

    /// Ask the processor to post its held lazy entries.
    pub fn flush(&self) -> Result<()> {
        self.send_message(Message::Flush)
    }

    fn send_message(&self, message: Message) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(Error::NotRunning);
        }
        self.sender.send(message).map_err(|_| Error::ChannelClosed)
    }
}

/// Handle to the processing thread.
///
/// The thread stops when [`stop`](Self::stop) is called or the handle is
/// dropped. Inputs still queued at that point are processed first.
pub struct Pipeline {
    sender: Sender<Message>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Start a processor on a new thread.
    pub fn spawn<H: OutputHandler + 'static>(
        manager: ManipulatorManager,
        handler: H,
    ) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Message>();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let thread_handle = thread::Builder::new()
            .name("kbremap-pipeline".into())
            .spawn(move || {
                let mut processor = Processor::new(manager, handler);
                for message in receiver.iter() {
                    match message {
                        Message::Input(input) => processor.process(input),
                        Message::Flush => processor.flush(),
                        Message::Stop => break,
                    }
                }
                if !processor.held_entries().is_empty() {
                    log::debug!(
                        "pipeline stopped with {} held entries",
                        processor.held_entries().len()
                    );
                }
                running_clone.store(false, Ordering::SeqCst);
            })
            .map_err(|e| Error::ThreadError(format!("failed to spawn pipeline thread: {e}")))?;

        log::info!("pipeline started");

        Ok(Self {
            sender,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
            running: self.running.clone(),
        }
    }

    pub fn send(&self, input: PipelineInput) -> Result<()> {
        if !self.is_running() {
            return Err(Error::NotRunning);
        }
        self.sender
            .send(Message::Input(input))
            .map_err(|_| Error::ChannelClosed)
    }

    /// Check if the processing thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the thread and wait for it to finish.
    pub fn stop(mut self) -> Result<()> {
        self.stop_inner()
    }

    fn stop_inner(&mut self) -> Result<()> {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(()); // Already stopped
        };

        // The thread may already be gone; joining is enough then.
        let _ = self.sender.send(Message::Stop);

        handle
            .join()
            .map_err(|_| Error::ThreadError("failed to join pipeline thread".into()))?;
        self.running.store(false, Ordering::SeqCst);
        log::info!("pipeline stopped");

        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let _ = self.stop_inner();
    }
}

/// Handler that sends entries to a bounded sync channel.
struct ChannelHandler {
    sender: SyncSender<Entry>,
}

impl OutputHandler for ChannelHandler {
    fn handle_entry(&mut self, entry: Entry) {
        // Blocks when the consumer lags; a dropped key_up would leave a key stuck.
        if self.sender.send(entry).is_err() {
            log::trace!("output receiver dropped");
        }
    }
}

/// Start a pipeline whose output goes to a bounded channel.
///
/// # Arguments
///
/// * `capacity` - Maximum number of entries to buffer. When the buffer is
///   full the processing thread waits for the consumer.
pub fn pipeline_channel(
    manager: ManipulatorManager,
    capacity: usize,
) -> Result<(Pipeline, Receiver<Entry>)> {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    let pipeline = Pipeline::spawn(manager, ChannelHandler { sender })?;
    Ok((pipeline, receiver))
}

// ============================================================================
// Tokio async support (behind feature flag)
// ============================================================================

#[cfg(feature = "tokio")]
pub use tokio_channel::*;

#[cfg(feature = "tokio")]
mod tokio_channel {
    use super::*;
    use tokio::sync::mpsc as tokio_mpsc;

    /// Handler that sends entries to a tokio async channel.
    struct TokioChannelHandler {
        sender: tokio_mpsc::Sender<Entry>,
    }

    impl OutputHandler for TokioChannelHandler {
        fn handle_entry(&mut self, entry: Entry) {
            // The processing thread is not a runtime thread, so blocking is fine.
            if self.sender.blocking_send(entry).is_err() {
                log::trace!("output receiver dropped");
            }
        }
    }

    /// Start a pipeline whose output goes to a tokio async channel.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use kbremap::manipulator::ManipulatorManager;
    /// use kbremap::pipeline::pipeline_async_channel;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let (pipeline, mut rx) = pipeline_async_channel(ManipulatorManager::new(), 100)
    ///         .expect("failed to start pipeline");
    ///
    ///     while let Some(entry) = rx.recv().await {
    ///         println!("{:?}", entry.event());
    ///     }
    /// }
    /// ```
    pub fn pipeline_async_channel(
        manager: ManipulatorManager,
        capacity: usize,
    ) -> Result<(Pipeline, tokio_mpsc::Receiver<Entry>)> {
        let (sender, receiver) = tokio_mpsc::channel(capacity);
        let pipeline = Pipeline::spawn(manager, TokioChannelHandler { sender })?;
        Ok((pipeline, receiver))
    }
}
