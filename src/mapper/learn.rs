//! Learn-mode capture: build bindings from inbound MIDI plus pressed params

use super::MidiMapper;
use crate::midi::Message;
use crate::params::ParamBank;
use crate::queue::{ControllerId, InputQueue, CONTROLLER_COUNT};
use tracing::{debug, info};

impl MidiMapper {
    /// One learn cycle: commit a binding completed on a previous cycle,
    /// then capture this cycle's gestures.
    pub(super) fn run_learn(
        &mut self,
        queues: [&InputQueue; CONTROLLER_COUNT],
        params: &ParamBank,
    ) {
        // A completed binding commits at the top of the next cycle. Learn
        // mode stays armed so several controls can be bound back to back.
        if self.learn.is_complete() {
            info!(
                "Binding committed: controller {:?} note {:?} cc {:?} -> param {:?}",
                self.learn.controller, self.learn.note, self.learn.cc, self.learn.param_id
            );
            self.table.commit(self.learn);
            self.learn.reset();
        }

        self.capture(queues, params);
    }

    /// Capture the two halves of a binding gesture into the in-progress
    /// mapping. Shared between Learn and ClearOne (unbinding needs the same
    /// gesture to identify its target).
    pub(super) fn capture(
        &mut self,
        queues: [&InputQueue; CONTROLLER_COUNT],
        params: &ParamBank,
    ) {
        // Physical control side. The last drained message wins, and
        // capturing a note clears a previously captured cc (and vice versa)
        // so the finished binding names exactly one of the two.
        for controller in ControllerId::all() {
            let queue = queues[controller.index()];
            while let Some(msg) = queue.shift() {
                match msg {
                    Message::NoteOn { note, .. } => {
                        self.learn.controller = Some(controller);
                        self.learn.note = Some(note);
                        self.learn.cc = None;
                    }
                    Message::ControlChange { cc, .. } => {
                        self.learn.controller = Some(controller);
                        self.learn.cc = Some(cc);
                        self.learn.note = None;
                    }
                    Message::NoteOff { .. } => {}
                }
            }
        }

        // Parameter side: first pressed learnable param, one per cycle
        if let Some(param_id) = params.scan_learnable() {
            if self.learn.param_id != Some(param_id) {
                debug!("Learn captured param {}", param_id);
            }
            self.learn.param_id = Some(param_id);
        }
    }

    /// Remove the binding identified by the in-progress learn mapping.
    /// Returns true when something was removed; the engine then drops out
    /// of clear/learn mode.
    pub(super) fn run_clear_one(&mut self) -> bool {
        if let Some(param_id) = self.learn.param_id {
            if let Some(index) = self.table.find_by_param(param_id) {
                self.table.remove(index);
                self.learn.reset();
                info!("Binding for param {} removed", param_id);
                return true;
            }
        }

        if let (Some(controller), Some(note)) = (self.learn.controller, self.learn.note) {
            if let Some(index) = self.table.find_by_note(controller, note) {
                self.table.remove(index);
                self.learn.reset();
                info!("Binding for note {}:{} removed", controller, note);
                return true;
            }
        }

        false
    }
}
