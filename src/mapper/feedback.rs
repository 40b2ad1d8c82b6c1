//! Pad feedback: mirror sequencer state onto the controller LEDs
//!
//! Velocities double as colors on grid controllers; the actual hue depends
//! on the hardware's palette, the levels below are what the original
//! hardware profiles expect.

use crate::mapping::MappingTable;
use crate::output::{FeedbackOutput, MidiSink};
use crate::params::{self, grid_coords, GRID_WIDTH};
use crate::queue::CONTROLLER_COUNT;
use crate::sequencer::SequencerCore;

/// Pad dark
pub const NONE: u8 = 0;
/// Step is set
pub const ACTIVE_STEP: u8 = 1;
/// Loop point (last step), step not set
pub const LOOP: u8 = 3;
/// Loop point on a set step
pub const LOOP_STEP: u8 = 5;
/// Current play position
pub const INDEX: u8 = 5;
/// Every bound pad while learn mode is armed
pub const LEARNING: u8 = 1;

/// Send feedback for every committed binding.
///
/// While learning, every bound pad lights with the constant `LEARNING`
/// velocity so the user can see what is already taken.
pub fn render<S: MidiSink>(
    table: &MappingTable,
    core: &SequencerCore,
    learning: bool,
    outputs: &mut [FeedbackOutput<S>; CONTROLLER_COUNT],
) {
    for mapping in table.iter() {
        // Only note-bound pads have an LED to drive
        let (controller, note) = match (mapping.controller, mapping.note) {
            (Some(controller), Some(note)) => (controller, note),
            _ => continue,
        };
        let param_id = match mapping.param_id {
            Some(param_id) => param_id,
            None => continue,
        };

        let velocity = if learning {
            LEARNING
        } else {
            match velocity_for(param_id, core) {
                Some(v) => v,
                None => continue,
            }
        };

        outputs[controller.index()].set_note(note, velocity);
    }
}

/// The velocity a parameter's pad should show, `None` when the parameter
/// has no feedback (reset, clock, learn)
fn velocity_for(param_id: usize, core: &SequencerCore) -> Option<u8> {
    if let Some((column, track_index)) = grid_coords(param_id) {
        let track = &core.tracks()[track_index];
        let step = core.page() * GRID_WIDTH + column;

        let set = core.step_at(core.page(), track_index, column);
        let velocity = if track.index() == Some(step) {
            INDEX
        } else if track.length() - 1 == step {
            if set {
                LOOP_STEP
            } else {
                LOOP
            }
        } else if set {
            ACTIVE_STEP
        } else {
            NONE
        };
        return Some(velocity);
    }

    if (params::ACTIVE_FIRST..=params::ACTIVE_LAST).contains(&param_id) {
        let track = &core.tracks()[param_id - params::ACTIVE_FIRST];
        return Some(track.active() as u8);
    }

    if (params::PAGE_FIRST..=params::PAGE_LAST).contains(&param_id) {
        let page = param_id - params::PAGE_FIRST;
        return Some((page == core.page()) as u8);
    }

    if param_id == params::SET_LENGTH {
        return Some(core.flags().set_length as u8);
    }

    None
}
