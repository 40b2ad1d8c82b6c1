//! Dispatch mode: inbound MIDI drives bound parameters

use super::MidiMapper;
use crate::midi::Message;
use crate::params::ParamBank;
use crate::queue::{ControllerId, InputQueue, CONTROLLER_COUNT};

impl MidiMapper {
    /// Drain both controller queues and write every matching binding's
    /// target parameter. Matching is by (controller, note) or
    /// (controller, cc); channel nibbles are ignored. Unrecognized statuses
    /// never reach here (dropped at parse).
    pub(super) fn run_dispatch(
        &mut self,
        queues: [&InputQueue; CONTROLLER_COUNT],
        params: &mut ParamBank,
    ) {
        for controller in ControllerId::all() {
            let queue = queues[controller.index()];
            while let Some(msg) = queue.shift() {
                match msg {
                    Message::NoteOff { note, .. } => {
                        Self::set_matching_note(&self.table, controller, note, 0, params);
                    }
                    Message::NoteOn { note, velocity, .. } => {
                        let value = if velocity > 0 { 1 } else { 0 };
                        Self::set_matching_note(&self.table, controller, note, value, params);
                    }
                    Message::ControlChange { cc, value, .. } => {
                        let value = if value > 0 { 1 } else { 0 };
                        for mapping in self.table.iter() {
                            if mapping.controller == Some(controller) && mapping.cc == Some(cc) {
                                if let Some(param_id) = mapping.param_id {
                                    params.set(param_id, value);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn set_matching_note(
        table: &crate::mapping::MappingTable,
        controller: ControllerId,
        note: u8,
        value: i32,
        params: &mut ParamBank,
    ) {
        for mapping in table.iter() {
            if mapping.controller == Some(controller) && mapping.note == Some(note) {
                if let Some(param_id) = mapping.param_id {
                    params.set(param_id, value);
                }
            }
        }
    }
}
