//! Module facade: one sequencer instance wired to its controllers
//!
//! Owns the engine, the mapper, the two inbound queues, and the two
//! feedback outputs, and runs them in the original per-cycle order: mapper
//! first (learn-family modes every cycle, dispatch rate-limited), then the
//! engine step, then feedback rendering behind its own divider.

use crate::mapper::{feedback, MidiMapper, Mode};
use crate::output::{FeedbackOutput, MidiSink};
use crate::queue::{ControllerId, InputQueue, CONTROLLER_COUNT};
use crate::sequencer::SequencerCore;
use crate::state::{PatchError, PatchState, PortSelections};
use crate::trigger::ClockDivider;
use std::path::Path;
use std::sync::Arc;

/// Inbound dispatch runs every Nth process cycle
pub const DISPATCH_DIVISION: u32 = 100;
/// Feedback rendering runs every Nth process cycle
pub const FEEDBACK_DIVISION: u32 = 10_000;

pub struct GridSeqModule<S: MidiSink> {
    core: SequencerCore,
    mapper: MidiMapper,
    inputs: [Arc<InputQueue>; CONTROLLER_COUNT],
    outputs: [FeedbackOutput<S>; CONTROLLER_COUNT],
    ports: PortSelections,
    dispatch_divider: ClockDivider,
    feedback_divider: ClockDivider,
}

impl<S: MidiSink> GridSeqModule<S> {
    /// Build a module around the two feedback sinks (left, right)
    pub fn new(left_sink: S, right_sink: S) -> Self {
        Self {
            core: SequencerCore::new(),
            mapper: MidiMapper::new(),
            inputs: [Arc::new(InputQueue::new()), Arc::new(InputQueue::new())],
            outputs: [
                FeedbackOutput::new(left_sink),
                FeedbackOutput::new(right_sink),
            ],
            ports: PortSelections::default(),
            dispatch_divider: ClockDivider::new(DISPATCH_DIVISION),
            feedback_divider: ClockDivider::new(FEEDBACK_DIVISION),
        }
    }

    pub fn core(&self) -> &SequencerCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SequencerCore {
        &mut self.core
    }

    pub fn mapper(&self) -> &MidiMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut MidiMapper {
        &mut self.mapper
    }

    /// Shared handle to a controller's inbound queue, for the input driver
    pub fn input_queue(&self, controller: ControllerId) -> Arc<InputQueue> {
        Arc::clone(&self.inputs[controller.index()])
    }

    pub fn output_mut(&mut self, controller: ControllerId) -> &mut FeedbackOutput<S> {
        &mut self.outputs[controller.index()]
    }

    pub fn ports(&self) -> &PortSelections {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut PortSelections {
        &mut self.ports
    }

    /// One process cycle. Runs to completion, never blocks.
    pub fn process(&mut self) {
        let mode = self.core.mapper_mode();
        let queues = [self.inputs[0].as_ref(), self.inputs[1].as_ref()];

        // The divider ticks every cycle so dispatch cadence is stable
        // regardless of how long learn mode was held
        let dispatch_due = self.dispatch_divider.process();
        let run_mapper = !matches!(mode, Mode::Dispatch) || dispatch_due;
        if run_mapper {
            let outcome = self.mapper.run_cycle(mode, queues, self.core.params_mut());
            self.core.acknowledge(outcome);
        }

        let was_learning = self.core.flags().learning;
        self.core.step();

        // Leaving learn mode via the panel button discards a half-built
        // binding
        if was_learning && !self.core.flags().learning {
            self.mapper.cancel_learn();
        }

        if self.feedback_divider.process() {
            feedback::render(
                self.mapper.table(),
                &self.core,
                self.core.flags().learning,
                &mut self.outputs,
            );
        }
    }

    /// Snapshot the persistable state
    pub fn capture_patch(&self) -> PatchState {
        PatchState::capture(&self.core, &self.mapper, &self.ports)
    }

    /// Restore from a patch document. Must not run concurrently with
    /// `process`; the exclusive borrow enforces that within one thread.
    pub fn apply_patch(&mut self, patch: &PatchState) {
        patch.apply(&mut self.core, &mut self.mapper, &mut self.ports);
    }

    pub fn save_patch(&self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        self.capture_patch().save_to_file(path)
    }

    pub fn load_patch(&mut self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        let patch = PatchState::load_from_file(path)?;
        self.apply_patch(&patch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::Message;
    use crate::output::CaptureSink;
    use crate::params::{grid_param, MIDI_LEARN};

    fn make_module() -> GridSeqModule<CaptureSink> {
        GridSeqModule::new(CaptureSink::default(), CaptureSink::default())
    }

    fn note_on(note: u8) -> Message {
        Message::NoteOn {
            channel: 0,
            note,
            velocity: 100,
        }
    }

    #[test]
    fn test_dispatch_is_rate_limited() {
        let mut module = make_module();
        module.mapper_mut().table_mut().commit(crate::mapping::MidiMapping {
            controller: Some(ControllerId::Left),
            note: Some(60),
            cc: None,
            param_id: Some(grid_param(0, 0)),
        });

        module.input_queue(ControllerId::Left).push(note_on(60));

        // The message waits in the queue until the dispatch divider fires
        module.process();
        assert_eq!(module.core().params().get(grid_param(0, 0)), 0);

        for _ in 0..DISPATCH_DIVISION {
            module.process();
        }
        assert_eq!(module.core().params().get(grid_param(0, 0)), 1);
    }

    #[test]
    fn test_learn_runs_every_cycle() {
        let mut module = make_module();
        module.core_mut().set_learning(true);

        module.input_queue(ControllerId::Right).push(note_on(42));
        module.process();

        let learn = module.mapper().learn_mapping();
        assert_eq!(learn.controller, Some(ControllerId::Right));
        assert_eq!(learn.note, Some(42));
    }

    #[test]
    fn test_learn_button_exit_discards_half_binding() {
        let mut module = make_module();

        // Enter learn mode from the panel
        module.core_mut().params_mut().set(MIDI_LEARN, 1);
        module.process();
        module.core_mut().params_mut().set(MIDI_LEARN, 0);
        module.process();
        assert!(module.core().flags().learning);

        // Capture only the MIDI half
        module.input_queue(ControllerId::Left).push(note_on(60));
        module.process();
        assert_eq!(module.mapper().learn_mapping().note, Some(60));

        // Toggle learn off; the half-built binding goes away
        module.core_mut().params_mut().set(MIDI_LEARN, 1);
        module.process();
        assert!(!module.core().flags().learning);
        assert_eq!(module.mapper().learn_mapping().note, None);
        assert_eq!(module.mapper().table().len(), 0);
    }

    #[test]
    fn test_feedback_renders_on_divider() {
        let mut module = make_module();
        module.mapper_mut().table_mut().commit(crate::mapping::MidiMapping {
            controller: Some(ControllerId::Left),
            note: Some(36),
            cc: None,
            param_id: Some(grid_param(0, 0)),
        });

        for _ in 0..FEEDBACK_DIVISION {
            module.process();
        }

        let sent = &module.output_mut(ControllerId::Left).sink().sent;
        assert!(!sent.is_empty());
        assert_eq!(sent[0][1], 36);
    }
}
