//! MIDI wire messages and value conversions
//!
//! Only the channel voice messages the sequencer core routes (note on/off,
//! control change) are modeled; everything else is ignored at parse time.

use std::fmt;

/// A channel voice message as it crosses the controller ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl Message {
    /// Parse a raw MIDI message.
    ///
    /// Returns `None` for anything this core does not route (system messages,
    /// pitch bend, aftertouch, running status, truncated data). Note On with
    /// velocity 0 is normalized to Note Off.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }

        let status = data[0];

        // Running status (data byte first) is not maintained here
        if status < 0x80 {
            return None;
        }

        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => Some(Message::NoteOff {
                channel,
                note: data[1] & 0x7F,
                velocity: data[2] & 0x7F,
            }),
            0x90 => {
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;

                if velocity == 0 {
                    Some(Message::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(Message::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => Some(Message::ControlChange {
                channel,
                cc: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            _ => None,
        }
    }

    /// Encode to the 3-byte wire form. Fixed-size, no allocation.
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            Message::NoteOff { channel, note, velocity } => {
                [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            Message::NoteOn { channel, note, velocity } => {
                [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            Message::ControlChange { channel, cc, value } => {
                [0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
        }
    }

    /// The channel nibble (0-15)
    pub fn channel(&self) -> u8 {
        match *self {
            Message::NoteOff { channel, .. }
            | Message::NoteOn { channel, .. }
            | Message::ControlChange { channel, .. } => channel,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Message::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            Message::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            Message::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_parsing() {
        let data = [0x90, 60, 100]; // Note On, ch 1, Middle C, velocity 100
        let msg = Message::parse(&data).unwrap();

        assert_eq!(msg, Message::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        });
    }

    #[test]
    fn test_note_on_velocity_zero() {
        let data = [0x90, 60, 0]; // Note On with velocity 0 = Note Off
        let msg = Message::parse(&data).unwrap();

        assert_eq!(msg, Message::NoteOff {
            channel: 0,
            note: 60,
            velocity: 0,
        });
    }

    #[test]
    fn test_control_change() {
        let data = [0xB2, 7, 100]; // CC ch 3, volume, value 100
        let msg = Message::parse(&data).unwrap();

        assert_eq!(msg, Message::ControlChange {
            channel: 2,
            cc: 7,
            value: 100,
        });
    }

    #[test]
    fn test_unroutable_statuses_ignored() {
        assert_eq!(Message::parse(&[0xE0, 0x00, 0x40]), None); // Pitch Bend
        assert_eq!(Message::parse(&[0xA0, 60, 10]), None); // Poly pressure
        assert_eq!(Message::parse(&[0xF8]), None); // Timing clock
        assert_eq!(Message::parse(&[0x90, 60]), None); // Truncated
        assert_eq!(Message::parse(&[60, 100, 0]), None); // Running status
    }

    #[test]
    fn test_encode_note_on() {
        let msg = Message::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        };

        assert_eq!(msg.to_bytes(), [0x90, 60, 100]);
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let msg = Message::ControlChange {
            channel: 5,
            cc: 20,
            value: 127,
        };
        assert_eq!(Message::parse(&msg.to_bytes()), Some(msg));
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x90, 60, 100]), "90 3C 64");
    }
}
