//! 14-bit MIDI CC aggregation
//!
//! MIDI 1.0 splits high-resolution controllers across two 7-bit CCs:
//! controllers 0-31 carry the MSB, 32-63 the matching LSB. How the two
//! halves merge depends on what the sending hardware actually does, so the
//! merge strategy is selectable at runtime. The strategy set is closed and
//! known at compile time, so it is a plain enum dispatched by match rather
//! than a trait object.

use crate::midi::Message;
use crate::queue::InputQueue;

/// Number of 14-bit controller pairs (MSB CC 0-31 + LSB CC 32-63)
pub const SLOT_COUNT: usize = 32;

/// Largest 14-bit value; `normalized()` divides by this
pub const MAX_14BIT: u16 = 0x3FFF;

/// A 14-bit register: bits 0-6 LSB, bits 7-13 MSB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FourteenBit {
    value: u16,
}

impl FourteenBit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Replace bits 7-13, keeping the LSB bits
    pub fn set_msb(&mut self, msb: u8) {
        self.value = (self.value & 0x007F) | (u16::from(msb & 0x7F) << 7);
    }

    /// Replace bits 0-6, keeping the MSB bits
    pub fn set_lsb(&mut self, lsb: u8) {
        self.value = (self.value & 0x3F80) | u16::from(lsb & 0x7F);
    }

    /// Set both halves in one step
    pub fn set_pair(&mut self, msb: u8, lsb: u8) {
        self.value = (u16::from(msb & 0x7F) << 7) | u16::from(lsb & 0x7F);
    }

    pub fn normalized(&self) -> f32 {
        f32::from(self.value) / f32::from(MAX_14BIT)
    }
}

/// How MSB and LSB messages merge into one register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregatorMode {
    /// MSB updates zero the LSB bits. Matches controllers that only ever
    /// send the MSB half; a stale LSB must not linger under a fresh MSB.
    #[default]
    ZeroingOnMsb,
    /// Each half updates only its own bits. For controllers that reliably
    /// send both.
    NoZeroing,
    /// MSB is held back until the matching LSB arrives, then both commit as
    /// one atomic update. A standalone LSB still fine-tunes the low bits.
    MsbFirstWaitForLsb,
}

/// One 14-bit controller slot under a given merge strategy
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    register: FourteenBit,
    pending_msb: Option<u8>,
}

impl Slot {
    fn set_msb(&mut self, mode: AggregatorMode, msb: u8) {
        match mode {
            AggregatorMode::ZeroingOnMsb => {
                self.register.set_msb(msb);
                self.register.set_lsb(0);
            }
            AggregatorMode::NoZeroing => self.register.set_msb(msb),
            AggregatorMode::MsbFirstWaitForLsb => self.pending_msb = Some(msb),
        }
    }

    fn set_lsb(&mut self, mode: AggregatorMode, lsb: u8) {
        match mode {
            AggregatorMode::ZeroingOnMsb | AggregatorMode::NoZeroing => {
                self.register.set_lsb(lsb)
            }
            AggregatorMode::MsbFirstWaitForLsb => match self.pending_msb.take() {
                Some(msb) => self.register.set_pair(msb, lsb),
                None => self.register.set_lsb(lsb),
            },
        }
    }
}

/// Bank of 32 independent 14-bit registers fed from one MIDI input
pub struct CcAggregatorBank {
    mode: AggregatorMode,
    slots: [Slot; SLOT_COUNT],
}

impl CcAggregatorBank {
    pub fn new(mode: AggregatorMode) -> Self {
        Self {
            mode,
            slots: [Slot::default(); SLOT_COUNT],
        }
    }

    pub fn mode(&self) -> AggregatorMode {
        self.mode
    }

    /// Switch strategy at runtime. Registers persist; a half-captured
    /// MSB must not commit across a strategy change, so pending flags clear.
    pub fn set_mode(&mut self, mode: AggregatorMode) {
        if mode != self.mode {
            self.mode = mode;
            for slot in &mut self.slots {
                slot.pending_msb = None;
            }
        }
    }

    /// Route one inbound message. CC 0-31 is the MSB of its slot, CC 32-63
    /// the LSB of slot cc-32; notes and higher CCs are ignored.
    pub fn on_message(&mut self, msg: Message) {
        if let Message::ControlChange { cc, value, .. } = msg {
            let cc = usize::from(cc);
            if cc < SLOT_COUNT {
                self.slots[cc].set_msb(self.mode, value);
            } else if cc < SLOT_COUNT * 2 {
                self.slots[cc - SLOT_COUNT].set_lsb(self.mode, value);
            }
        }
    }

    /// Drain an input queue through `on_message`
    pub fn process(&mut self, queue: &InputQueue) {
        while let Some(msg) = queue.shift() {
            self.on_message(msg);
        }
    }

    /// Normalized value of one slot, in [0, 1]
    pub fn value(&self, slot: usize) -> f32 {
        self.slots
            .get(slot)
            .map(|s| s.register.normalized())
            .unwrap_or(0.0)
    }

    /// Raw 14-bit register of one slot
    pub fn register(&self, slot: usize) -> u16 {
        self.slots
            .get(slot)
            .map(|s| s.register.value())
            .unwrap_or(0)
    }

    /// All 32 normalized values
    pub fn values(&self) -> [f32; SLOT_COUNT] {
        let mut out = [0.0; SLOT_COUNT];
        for (i, slot) in self.slots.iter().enumerate() {
            out[i] = slot.register.normalized();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(cc: u8, value: u8) -> Message {
        Message::ControlChange {
            channel: 0,
            cc,
            value,
        }
    }

    #[test]
    fn test_fourteen_bit_packing() {
        let mut reg = FourteenBit::new();
        reg.set_msb(5);
        reg.set_lsb(10);
        assert_eq!(reg.value(), (5 << 7) | 10);

        reg.set_msb(0x7F);
        reg.set_lsb(0x7F);
        assert_eq!(reg.value(), MAX_14BIT);
        assert_eq!(reg.normalized(), 1.0);
    }

    /// An MSB-only update is identical to MSB followed by LSB 0
    #[test]
    fn test_zeroing_on_msb() {
        for msb in 0..=127u8 {
            let mut a = CcAggregatorBank::new(AggregatorMode::ZeroingOnMsb);
            a.on_message(cc(0, 64)); // leave a stale LSB behind
            a.on_message(cc(32, 33));
            a.on_message(cc(0, msb));

            let mut b = CcAggregatorBank::new(AggregatorMode::ZeroingOnMsb);
            b.on_message(cc(0, msb));
            b.on_message(cc(32, 0));

            assert_eq!(a.register(0), b.register(0));
            assert_eq!(a.register(0), u16::from(msb) << 7);
        }
    }

    #[test]
    fn test_no_zeroing_keeps_other_half() {
        let mut bank = CcAggregatorBank::new(AggregatorMode::NoZeroing);
        bank.on_message(cc(32, 33)); // LSB of slot 0
        bank.on_message(cc(0, 5)); // MSB of slot 0

        assert_eq!(bank.register(0), (5 << 7) | 33);
    }

    #[test]
    fn test_msb_first_commits_pair() {
        let mut bank = CcAggregatorBank::new(AggregatorMode::MsbFirstWaitForLsb);
        bank.on_message(cc(0, 5));
        // MSB held back until the LSB lands
        assert_eq!(bank.register(0), 0);

        bank.on_message(cc(32, 10));
        assert_eq!(bank.register(0), (5 << 7) | 10);

        // Standalone LSB only touches the low bits
        bank.on_message(cc(32, 20));
        assert_eq!(bank.register(0), (5 << 7) | 20);
    }

    #[test]
    fn test_mode_switch_keeps_registers_drops_pending() {
        let mut bank = CcAggregatorBank::new(AggregatorMode::MsbFirstWaitForLsb);
        bank.on_message(cc(0, 5));
        bank.on_message(cc(32, 10));
        bank.on_message(cc(1, 99)); // pending on slot 1

        bank.set_mode(AggregatorMode::NoZeroing);
        assert_eq!(bank.register(0), (5 << 7) | 10);

        // The half-captured MSB on slot 1 was discarded
        bank.set_mode(AggregatorMode::MsbFirstWaitForLsb);
        bank.on_message(cc(33, 1));
        assert_eq!(bank.register(1), 1);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut bank = CcAggregatorBank::new(AggregatorMode::NoZeroing);
        bank.on_message(cc(3, 100));
        bank.on_message(cc(35, 50)); // LSB of slot 3
        bank.on_message(cc(4, 1));

        assert_eq!(bank.register(3), (100 << 7) | 50);
        assert_eq!(bank.register(4), 1 << 7);
        assert_eq!(bank.register(5), 0);
    }

    #[test]
    fn test_notes_and_high_ccs_ignored() {
        let mut bank = CcAggregatorBank::new(AggregatorMode::NoZeroing);
        bank.on_message(Message::NoteOn {
            channel: 0,
            note: 10,
            velocity: 100,
        });
        bank.on_message(cc(64, 100)); // beyond the LSB range

        assert_eq!(bank.values(), [0.0; SLOT_COUNT]);
    }

    #[test]
    fn test_process_drains_queue() {
        let queue = InputQueue::new();
        queue.push(cc(0, 5));
        queue.push(cc(32, 10));

        let mut bank = CcAggregatorBank::new(AggregatorMode::NoZeroing);
        bank.process(&queue);

        assert_eq!(bank.register(0), (5 << 7) | 10);
        assert_eq!(queue.shift(), None);
    }
}
