//! Parameter bank and panel layout
//!
//! Every bindable control on the panel is an integer-valued parameter slot.
//! The layout is fixed: an 8-track, 16-column grid (one page of the 64-step
//! sequence), per-track active toggles, page selects, and the single
//! transport/mode buttons.

/// Sequencer lanes
pub const TRACK_COUNT: usize = 8;
/// Visible grid columns (one page)
pub const GRID_WIDTH: usize = 16;
/// Pages of the sequence window
pub const PAGE_COUNT: usize = 4;
/// Steps per track
pub const MAX_SEQUENCE_LENGTH: usize = 64;

/// Grid step buttons, row-major: param = track * GRID_WIDTH + column
pub const GRID_FIRST: usize = 0;
pub const GRID_LAST: usize = GRID_FIRST + TRACK_COUNT * GRID_WIDTH - 1;

/// Per-track active (mute) toggles
pub const ACTIVE_FIRST: usize = GRID_LAST + 1;
pub const ACTIVE_LAST: usize = ACTIVE_FIRST + TRACK_COUNT - 1;

/// Page select buttons
pub const PAGE_FIRST: usize = ACTIVE_LAST + 1;
pub const PAGE_LAST: usize = PAGE_FIRST + PAGE_COUNT - 1;

pub const SET_LENGTH: usize = PAGE_LAST + 1;
pub const RESET: usize = SET_LENGTH + 1;
pub const CLOCK: usize = RESET + 1;
pub const MIDI_LEARN: usize = CLOCK + 1;

pub const PARAM_COUNT: usize = MIDI_LEARN + 1;

/// Upper bound on committed mappings: every learnable parameter bound once.
/// The mapping table reserves this up front so learn-commit never allocates
/// on the processing thread.
pub const MAP_CAPACITY: usize =
    (GRID_LAST - GRID_FIRST + 1) + TRACK_COUNT + PAGE_COUNT + 2;

/// Param id for the grid button at (column, track)
pub fn grid_param(column: usize, track: usize) -> usize {
    GRID_FIRST + track * GRID_WIDTH + column
}

/// (column, track) for a grid param id, `None` if the id is not a grid button
pub fn grid_coords(param_id: usize) -> Option<(usize, usize)> {
    if (GRID_FIRST..=GRID_LAST).contains(&param_id) {
        let offset = param_id - GRID_FIRST;
        Some((offset % GRID_WIDTH, offset / GRID_WIDTH))
    } else {
        None
    }
}

/// Integer-valued parameter slots addressed by param id
pub struct ParamBank {
    values: [i32; PARAM_COUNT],
}

impl ParamBank {
    pub fn new() -> Self {
        Self {
            values: [0; PARAM_COUNT],
        }
    }

    /// Read a slot. Out-of-range ids read as 0.
    pub fn get(&self, param_id: usize) -> i32 {
        self.values.get(param_id).copied().unwrap_or(0)
    }

    /// Write a slot. Out-of-range ids are ignored, never a panic on the
    /// processing thread.
    pub fn set(&mut self, param_id: usize, value: i32) {
        if let Some(slot) = self.values.get_mut(param_id) {
            *slot = value;
        }
    }

    /// Find the first pressed (non-zero) learnable parameter.
    ///
    /// Ranges are scanned in binding-priority order: grid steps first (the
    /// common target, so they win when several buttons are down in one
    /// cycle), then active toggles, page selects, and the single buttons.
    pub fn scan_learnable(&self) -> Option<usize> {
        let ranges = [
            (GRID_FIRST, GRID_LAST),
            (ACTIVE_FIRST, ACTIVE_LAST),
            (PAGE_FIRST, PAGE_LAST),
            (SET_LENGTH, SET_LENGTH),
            (RESET, RESET),
        ];

        for (first, last) in ranges {
            for param_id in first..=last {
                if self.values[param_id] != 0 {
                    return Some(param_id);
                }
            }
        }
        None
    }
}

impl Default for ParamBank {
    fn default() -> Self {
        Self::new()
    }
}
