//! MIDI mapper - learn, dispatch, and pad feedback
//!
//! The mapper sits between the controller queues and the parameter bank.
//! In `Dispatch` mode inbound notes and CCs drive their bound parameters;
//! `Learn` diverts inbound MIDI into building a new binding instead;
//! `ClearOne`/`ClearAll` remove bindings. The mode is derived by the engine
//! from its control flags and passed in explicitly each cycle, and the
//! in-progress learn mapping lives here under exclusive ownership, so there
//! is no implicit flag-clearing order to get wrong.

mod dispatch;
pub mod feedback;
mod learn;


use crate::mapping::{MappingTable, MidiMapping};
use crate::params::ParamBank;
use crate::queue::{InputQueue, CONTROLLER_COUNT};

/// What the mapper should do with this cycle's inbound MIDI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Route inbound MIDI to bound parameters
    Dispatch,
    /// Capture inbound MIDI and pressed params into a new binding
    Learn,
    /// Remove the binding the next learn gesture identifies
    ClearOne,
    /// Drop the whole table
    ClearAll,
}

/// What the mapper actually did; the engine resets its flags from this
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOutcome {
    /// A single binding was removed (ClearOne completed)
    pub cleared_one: bool,
    /// The table was emptied (ClearAll completed)
    pub cleared_all: bool,
}

pub struct MidiMapper {
    table: MappingTable,
    /// Binding under construction while learn mode is armed
    learn: MidiMapping,
}

impl MidiMapper {
    pub fn new() -> Self {
        Self {
            table: MappingTable::new(),
            learn: MidiMapping::default(),
        }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut MappingTable {
        &mut self.table
    }

    /// The binding currently under construction (for UI highlighting)
    pub fn learn_mapping(&self) -> &MidiMapping {
        &self.learn
    }

    /// Discard the in-progress binding (leaving learn mode)
    pub fn cancel_learn(&mut self) {
        self.learn.reset();
    }

    /// Run one mapper cycle. Queues are drained non-blocking; nothing here
    /// allocates or suspends.
    pub fn run_cycle(
        &mut self,
        mode: Mode,
        queues: [&InputQueue; CONTROLLER_COUNT],
        params: &mut ParamBank,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();

        match mode {
            Mode::ClearAll => {
                self.table.clear();
                self.learn.reset();
                outcome.cleared_all = true;
            }
            Mode::ClearOne => {
                // Try to clear first, then keep capturing: the gesture that
                // identifies the binding to remove may arrive over the next
                // few cycles.
                outcome.cleared_one = self.run_clear_one();
                if !outcome.cleared_one {
                    self.capture(queues, params);
                }
            }
            Mode::Learn => {
                self.run_learn(queues, params);
            }
            Mode::Dispatch => {
                self.run_dispatch(queues, params);
            }
        }

        outcome
    }
}

impl Default for MidiMapper {
    fn default() -> Self {
        Self::new()
    }
}
