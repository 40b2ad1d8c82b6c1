//! Sequencer engine
//!
//! Owns the tracks, the page register, and the control flags that drive the
//! router's mode. Runs once per process cycle on the processing thread:
//! button params are edge-detected into gestures, the clock edge advances
//! every track, and trigger pulses are latched for the host to read.

use crate::mapper::Mode;
use crate::params::{
    self, grid_coords, ParamBank, GRID_WIDTH, PAGE_COUNT, TRACK_COUNT,
};
use crate::track::Track;
use crate::trigger::GateTrigger;
use tracing::debug;

/// Engine-owned flags consumed by the mapper each cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlFlags {
    /// MIDI learn mode is armed
    pub learning: bool,
    /// Next learn gesture removes a binding instead of creating one
    pub clear_one: bool,
    /// Remove every binding on the next cycle
    pub clear_all: bool,
    /// Next grid press sets the track's loop length
    pub set_length: bool,
}

pub struct SequencerCore {
    tracks: [Track; TRACK_COUNT],
    page: usize,
    params: ParamBank,
    flags: ControlFlags,
    /// Trigger pulse per track, valid for the cycle after a clock edge
    triggers: [bool; TRACK_COUNT],
    edges: [GateTrigger; params::PARAM_COUNT],
}

impl SequencerCore {
    pub fn new() -> Self {
        Self {
            tracks: std::array::from_fn(|_| Track::new()),
            page: 0,
            params: ParamBank::new(),
            flags: ControlFlags::default(),
            triggers: [false; TRACK_COUNT],
            edges: [GateTrigger::new(); params::PARAM_COUNT],
        }
    }

    pub fn tracks(&self) -> &[Track; TRACK_COUNT] {
        &self.tracks
    }

    pub fn track_mut(&mut self, index: usize) -> &mut Track {
        &mut self.tracks[index]
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        if page < PAGE_COUNT {
            self.page = page;
        }
    }

    pub fn params(&self) -> &ParamBank {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamBank {
        &mut self.params
    }

    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    /// Trigger pulses latched by the last `step`
    pub fn triggers(&self) -> &[bool; TRACK_COUNT] {
        &self.triggers
    }

    /// Arm learn mode (host command, same as the learn button)
    pub fn set_learning(&mut self, learning: bool) {
        self.flags.learning = learning;
    }

    /// Host command: the next learn gesture unbinds instead of binding
    pub fn request_clear_mapping(&mut self) {
        self.flags.clear_one = true;
        self.flags.clear_all = false;
        self.flags.set_length = false;
        self.flags.learning = true;
    }

    /// Host command: drop every binding on the next cycle
    pub fn request_clear_all_mappings(&mut self) {
        self.flags.clear_one = false;
        self.flags.clear_all = true;
        self.flags.set_length = false;
        self.flags.learning = false;
    }

    /// The mapper mode for this cycle, highest-priority flag first
    pub fn mapper_mode(&self) -> Mode {
        if self.flags.clear_all {
            Mode::ClearAll
        } else if self.flags.clear_one {
            Mode::ClearOne
        } else if self.flags.learning {
            Mode::Learn
        } else {
            Mode::Dispatch
        }
    }

    /// Acknowledge what the mapper did this cycle and reset the matching
    /// flags
    pub fn acknowledge(&mut self, outcome: crate::mapper::CycleOutcome) {
        if outcome.cleared_all {
            self.flags.clear_all = false;
        }
        if outcome.cleared_one {
            self.flags.clear_one = false;
            self.flags.learning = false;
        }
    }

    /// Run one engine cycle: edge-detect button params into gestures, then
    /// apply clock and reset.
    pub fn step(&mut self) {
        self.triggers = [false; TRACK_COUNT];

        // Edges must be fed every cycle, including during learn, so a button
        // held across a mode change does not replay as a fresh press.
        let mut pressed = [false; params::PARAM_COUNT];
        for (param_id, edge) in self.edges.iter_mut().enumerate() {
            pressed[param_id] = edge.process(self.params.get(param_id));
        }

        if pressed[params::MIDI_LEARN] {
            self.flags.learning = !self.flags.learning;
            debug!("Learn mode {}", if self.flags.learning { "on" } else { "off" });
        }

        // While learning, grid/active/page/set-length presses are binding
        // gestures for the mapper, not edits
        if !self.flags.learning {
            self.apply_edit_gestures(&pressed);
        }

        if pressed[params::CLOCK] {
            self.clock_tick();
        }

        if pressed[params::RESET] {
            self.reset_all();
        }
    }

    fn apply_edit_gestures(&mut self, pressed: &[bool; params::PARAM_COUNT]) {
        for param_id in params::GRID_FIRST..=params::GRID_LAST {
            if !pressed[param_id] {
                continue;
            }
            let (column, track) = match grid_coords(param_id) {
                Some(coords) => coords,
                None => continue,
            };
            let step = self.page * GRID_WIDTH + column;

            if self.flags.set_length {
                self.tracks[track].set_length(step + 1);
                self.flags.set_length = false;
                debug!("Track {} length set to {}", track, step + 1);
            } else {
                self.tracks[track].toggle_step(step);
            }
        }

        for track in 0..TRACK_COUNT {
            if pressed[params::ACTIVE_FIRST + track] {
                self.tracks[track].toggle_active();
            }
        }

        for page in 0..PAGE_COUNT {
            if pressed[params::PAGE_FIRST + page] {
                self.page = page;
            }
        }

        if pressed[params::SET_LENGTH] {
            self.flags.set_length = !self.flags.set_length;
        }
    }

    /// Advance every track one step; an active track landing on a set step
    /// latches its trigger pulse
    pub fn clock_tick(&mut self) {
        for (i, track) in self.tracks.iter_mut().enumerate() {
            let hit = track.advance();
            self.triggers[i] = hit && track.active();
        }
    }

    /// Stop playback on every track; the next clock re-enters at step 0
    pub fn reset_all(&mut self) {
        for track in &mut self.tracks {
            track.reset();
        }
    }

    /// Whether the step shown at (column, track) on the current page is set
    pub fn step_at(&self, page: usize, track: usize, column: usize) -> bool {
        self.tracks[track].step(page * GRID_WIDTH + column)
    }
}

impl Default for SequencerCore {
    fn default() -> Self {
        Self::new()
    }
}
