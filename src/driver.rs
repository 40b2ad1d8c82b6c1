//! MIDI device binding
//!
//! Connects real controller hardware to the module: an input connection
//! parses incoming bytes and pushes them into a controller's bounded queue
//! from the midir callback thread; an output connection is a `MidiSink` for
//! the feedback renderer.

use crate::midi::{format_hex, Message};
use crate::output::MidiSink;
use crate::queue::InputQueue;
use anyhow::{anyhow, Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "gridseq";

/// List available MIDI input port names
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;

    let mut port_names = Vec::new();
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            port_names.push(name);
        }
    }

    Ok(port_names)
}

/// List available MIDI output port names
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new(CLIENT_NAME).context("Failed to create MIDI output")?;

    let mut port_names = Vec::new();
    for port in midi_out.ports() {
        if let Ok(name) = midi_out.port_name(&port) {
            port_names.push(name);
        }
    }

    Ok(port_names)
}

/// Find an input port by case-insensitive substring match
fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(midir::MidiInputPort, String)> {
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            if name.to_lowercase().contains(&pattern.to_lowercase()) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

/// Find an output port by case-insensitive substring match
fn find_output_port(
    midi_out: &MidiOutput,
    pattern: &str,
) -> Option<(midir::MidiOutputPort, String)> {
    for port in midi_out.ports() {
        if let Ok(name) = midi_out.port_name(&port) {
            if name.to_lowercase().contains(&pattern.to_lowercase()) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

/// A live input connection feeding one controller's queue.
/// Dropping it closes the port.
pub struct InputBinding {
    port_name: String,
    _conn: MidiInputConnection<()>,
}

impl InputBinding {
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Connect a controller input. Parsed messages go straight into `queue`
/// from the callback thread; anything the core does not route is dropped
/// at parse.
pub fn connect_input(pattern: &str, queue: Arc<InputQueue>) -> Result<InputBinding> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;

    let (port, port_name) = find_input_port(&midi_in, pattern)
        .ok_or_else(|| anyhow!("Input port '{}' not found", pattern))?;

    let conn = midi_in
        .connect(
            &port,
            CLIENT_NAME,
            move |_timestamp, data, _| {
                if let Some(msg) = Message::parse(data) {
                    queue.push(msg);
                } else {
                    debug!("Ignoring unroutable MIDI: {}", format_hex(data));
                }
            },
            (),
        )
        .map_err(|e| anyhow!("Failed to connect input '{}': {}", port_name, e))?;

    info!("Connected controller input: {}", port_name);

    Ok(InputBinding {
        port_name,
        _conn: conn,
    })
}

/// A live output connection. Implements `MidiSink` so it plugs directly
/// into a `FeedbackOutput`.
pub struct OutputBinding {
    port_name: String,
    conn: Arc<Mutex<MidiOutputConnection>>,
}

impl OutputBinding {
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Connect a controller output for feedback
pub fn connect_output(pattern: &str) -> Result<OutputBinding> {
    let midi_out = MidiOutput::new(CLIENT_NAME).context("Failed to create MIDI output")?;

    let (port, port_name) = find_output_port(&midi_out, pattern)
        .ok_or_else(|| anyhow!("Output port '{}' not found", pattern))?;

    let conn = midi_out
        .connect(&port, CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to connect output '{}': {}", port_name, e))?;

    info!("Connected controller output: {}", port_name);

    Ok(OutputBinding {
        port_name,
        conn: Arc::new(Mutex::new(conn)),
    })
}

impl MidiSink for OutputBinding {
    fn send(&mut self, bytes: [u8; 3]) {
        if let Err(e) = self.conn.lock().send(&bytes) {
            warn!("MIDI send failed on '{}': {}", self.port_name, e);
        }
    }
}
