//! Inbound MIDI queues
//!
//! One bounded queue per physical controller. The driver callback thread
//! pushes; the processing thread drains with `shift()` at the top of each
//! cycle and never blocks.

use crate::midi::Message;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Number of physical pad controllers (left and right grid halves)
pub const CONTROLLER_COUNT: usize = 2;

/// Identifies one of the two physical controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerId {
    Left,
    Right,
}

impl ControllerId {
    /// Both controllers, in queue-drain order
    pub fn all() -> [ControllerId; CONTROLLER_COUNT] {
        [ControllerId::Left, ControllerId::Right]
    }

    /// Queue/port index (0 = left, 1 = right)
    pub fn index(&self) -> usize {
        match self {
            ControllerId::Left => 0,
            ControllerId::Right => 1,
        }
    }

    /// Inverse of `index`
    pub fn from_index(index: usize) -> Option<ControllerId> {
        match index {
            0 => Some(ControllerId::Left),
            1 => Some(ControllerId::Right),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Queue depth per controller. Generous for pad bursts; a full queue drops
/// the newest message rather than stalling the driver callback.
pub const QUEUE_DEPTH: usize = 512;

/// Bounded FIFO between a controller's input driver and the process cycle
pub struct InputQueue {
    messages: ArrayQueue<Message>,
    dropped: AtomicU64,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            messages: ArrayQueue::new(QUEUE_DEPTH),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue from the driver callback thread. Never blocks.
    pub fn push(&self, msg: Message) {
        if self.messages.push(msg).is_err() {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("Input queue full, dropped message ({} total)", total);
        }
    }

    /// Dequeue the oldest pending message. Never blocks.
    pub fn shift(&self) -> Option<Message> {
        self.messages.pop()
    }

    /// Messages dropped due to overflow since construction
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_on(note: u8) -> Message {
        Message::NoteOn {
            channel: 0,
            note,
            velocity: 100,
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = InputQueue::new();
        queue.push(note_on(1));
        queue.push(note_on(2));

        assert_eq!(queue.shift(), Some(note_on(1)));
        assert_eq!(queue.shift(), Some(note_on(2)));
        assert_eq!(queue.shift(), None);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let queue = InputQueue::new();
        for i in 0..QUEUE_DEPTH {
            queue.push(note_on((i % 128) as u8));
        }

        queue.push(note_on(99));
        assert_eq!(queue.dropped(), 1);

        // Oldest message survived
        assert_eq!(queue.shift(), Some(note_on(0)));
    }

    #[test]
    fn test_controller_index_roundtrip() {
        for id in ControllerId::all() {
            assert_eq!(ControllerId::from_index(id.index()), Some(id));
        }
        assert_eq!(ControllerId::from_index(2), None);
    }
}
