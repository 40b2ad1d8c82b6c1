//! Outbound feedback ports
//!
//! Each controller has a feedback output that lights pads by sending note
//! velocities. CC sends are suppressed when the value is unchanged; note
//! sends are not deduplicated and always go out on the wire (see
//! `note_feedback_is_resent_unchanged`).

use crate::midi::Message;

/// Destination for encoded feedback messages. Implementations must be cheap:
/// sends happen on the processing thread.
pub trait MidiSink {
    fn send(&mut self, bytes: [u8; 3]);
}

/// A `MidiSink` that records messages, for tests and dry runs
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub sent: Vec<[u8; 3]>,
}

impl MidiSink for CaptureSink {
    fn send(&mut self, bytes: [u8; 3]) {
        self.sent.push(bytes);
    }
}

/// Feedback output with per-port shadow state
pub struct FeedbackOutput<S: MidiSink> {
    sink: S,
    /// Last CC value sent per controller number, -1 = unknown
    current_cc: [i16; 128],
    /// Whether each note is currently lit (velocity > 0)
    current_notes: [bool; 128],
}

impl<S: MidiSink> FeedbackOutput<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            current_cc: [-1; 128],
            current_notes: [false; 128],
        }
    }

    /// Forget all shadow state so every subsequent send goes to the wire
    pub fn reset(&mut self) {
        self.current_cc = [-1; 128];
        self.current_notes = [false; 128];
    }

    /// Send a CC, suppressing the send when the value is unchanged
    pub fn set_cc(&mut self, cc: u8, value: u8) {
        let slot = (cc & 0x7F) as usize;
        if i16::from(value) == self.current_cc[slot] {
            return;
        }
        self.current_cc[slot] = i16::from(value);

        let msg = Message::ControlChange {
            channel: 0,
            cc,
            value,
        };
        self.sink.send(msg.to_bytes());
    }

    /// Light a pad. Velocity 0 extinguishes it. Always sent, even when the
    /// velocity matches the last send.
    pub fn set_note(&mut self, note: u8, velocity: u8) {
        let msg = Message::NoteOn {
            channel: 0,
            note,
            velocity,
        };
        self.sink.send(msg.to_bytes());
        self.current_notes[(note & 0x7F) as usize] = velocity > 0;
    }

    /// Extinguish a pad unconditionally
    pub fn reset_note(&mut self, note: u8) {
        self.set_note(note, 0);
    }

    /// Whether a pad is currently lit according to the shadow state
    pub fn note_lit(&self, note: u8) -> bool {
        self.current_notes[(note & 0x7F) as usize]
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
