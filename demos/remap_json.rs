//! Remap JSON events read from stdin.
//!
//! Run with: cargo run --example remap_json -- manipulators.json
//!
//! Each stdin line is one input event:
//!
//! ```text
//! {"device_id": 1, "event_type": "key_down",
//!  "event": {"type": "key_code", "key_code": "caps_lock"}}
//! ```
//!
//! (shown wrapped here; each event goes on a single line)
//!
//! Every entry that survives manipulation is printed as JSON.

use kbremap::manipulator::{ManipulatorManager, load_manipulators};
use kbremap::pipeline::{PipelineInput, pipeline_channel};
use kbremap::types::NoDeviceInfo;
use kbremap::{AbsoluteTime, DeviceId, Event, EventType};
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;

fn parse_line(line: &str) -> Option<PipelineInput> {
    let value: Value = serde_json::from_str(line).ok()?;
    let device_id = DeviceId(value.get("device_id").and_then(Value::as_u64).unwrap_or(1));
    let event_type: EventType = serde_json::from_value(value.get("event_type")?.clone()).ok()?;
    let event = Event::make_from_json(value.get("event")?)?;

    Some(PipelineInput::Event {
        device_id,
        time_stamp: AbsoluteTime::now(),
        event,
        event_type,
    })
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("usage: remap_json <manipulators.json>");
    let json = std::fs::read_to_string(&path).expect("Failed to read configuration");
    let configs = load_manipulators(&json).expect("Invalid configuration");
    let manager = ManipulatorManager::from_configs(&configs, Arc::new(NoDeviceInfo))
        .expect("Invalid manipulators");

    println!("kbremap JSON remapper ({} manipulators)", manager.len());
    println!("Type one event per line, Ctrl+D to exit.\n");

    let (pipeline, rx) = pipeline_channel(manager, 100).expect("Failed to start pipeline");

    let printer = std::thread::spawn(move || {
        for entry in rx.iter() {
            println!("{}", entry.to_json());
        }
    });

    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(input) => pipeline.send(input).expect("Pipeline stopped"),
            None => eprintln!("Ignoring malformed line: {line}"),
        }
    }

    // Stopping drops the output sender, which ends the printer loop.
    let _ = pipeline.stop();
    let _ = printer.join();
}
