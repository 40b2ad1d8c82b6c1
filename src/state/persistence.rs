//! Patch persistence to JSON documents
//!
//! One document per module instance. The format is tolerant on load: every
//! field is optional and applied independently, so a missing or null field
//! leaves the corresponding state untouched and unknown extra fields are
//! ignored. Sequences are 64-bit but JSON integers in older hosts are not,
//! so each sequence is stored as hi/low 32-bit halves.

use crate::mapper::MidiMapper;
use crate::mapping::MidiMapping;
use crate::params::{PARAM_COUNT, TRACK_COUNT};
use crate::queue::ControllerId;
use crate::sequencer::SequencerCore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to read or write patch file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed patch document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted MIDI device choice for one port, so a reload can rebind the
/// same hardware
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<i8>,
}

/// Device choices for all four ports of a module instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortSelections {
    pub input_left: Option<PortSelection>,
    pub input_right: Option<PortSelection>,
    pub output_left: Option<PortSelection>,
    pub output_right: Option<PortSelection>,
}

/// One binding as it appears on disk: plain integers, -1 = unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub controller: i32,
    pub note: i32,
    pub cc: i32,
    #[serde(rename = "paramId")]
    pub param_id: i32,
}

impl BindingRecord {
    fn from_mapping(mapping: &MidiMapping) -> Self {
        Self {
            controller: mapping
                .controller
                .map(|c| c.index() as i32)
                .unwrap_or(-1),
            note: mapping.note.map(i32::from).unwrap_or(-1),
            cc: mapping.cc.map(i32::from).unwrap_or(-1),
            param_id: mapping.param_id.map(|p| p as i32).unwrap_or(-1),
        }
    }

    /// Validate into a live mapping. A record that is incomplete, names an
    /// unknown controller, or points outside the parameter range is
    /// rejected rather than kept as a latent binding.
    fn to_mapping(self) -> Option<MidiMapping> {
        let controller = usize::try_from(self.controller)
            .ok()
            .and_then(ControllerId::from_index)?;

        let note = match self.note {
            -1 => None,
            n @ 0..=127 => Some(n as u8),
            _ => return None,
        };
        let cc = match self.cc {
            -1 => None,
            c @ 0..=127 => Some(c as u8),
            _ => return None,
        };

        let param_id = usize::try_from(self.param_id).ok()?;
        if param_id >= PARAM_COUNT {
            return None;
        }

        let mapping = MidiMapping {
            controller: Some(controller),
            note,
            cc,
            param_id: Some(param_id),
        };
        mapping.is_complete().then_some(mapping)
    }
}

/// The persisted patch document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actives: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lengths: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<i64>>,
    /// Bits 32-63 of each track's sequence
    #[serde(rename = "sequenceHi", default, skip_serializing_if = "Option::is_none")]
    pub sequence_hi: Option<Vec<u32>>,
    /// Bits 0-31 of each track's sequence
    #[serde(rename = "sequenceLow", default, skip_serializing_if = "Option::is_none")]
    pub sequence_low: Option<Vec<u32>>,
    #[serde(rename = "midiBinding", default, skip_serializing_if = "Option::is_none")]
    pub midi_binding: Option<Vec<BindingRecord>>,
    #[serde(rename = "midiInputLeft", default, skip_serializing_if = "Option::is_none")]
    pub midi_input_left: Option<PortSelection>,
    #[serde(rename = "midiInputRight", default, skip_serializing_if = "Option::is_none")]
    pub midi_input_right: Option<PortSelection>,
    #[serde(rename = "midiOutputLeft", default, skip_serializing_if = "Option::is_none")]
    pub midi_output_left: Option<PortSelection>,
    #[serde(rename = "midiOutputRight", default, skip_serializing_if = "Option::is_none")]
    pub midi_output_right: Option<PortSelection>,
}

impl PatchState {
    /// Snapshot the live state into a document
    pub fn capture(core: &SequencerCore, mapper: &MidiMapper, ports: &PortSelections) -> Self {
        let tracks = core.tracks();

        Self {
            actives: Some(tracks.iter().map(|t| t.active()).collect()),
            lengths: Some(tracks.iter().map(|t| t.length() as i64).collect()),
            index: Some(
                tracks
                    .iter()
                    .map(|t| t.index().map(|i| i as i64).unwrap_or(-1))
                    .collect(),
            ),
            sequence_hi: Some(
                tracks
                    .iter()
                    .map(|t| ((t.sequence() >> 32) & 0xFFFF_FFFF) as u32)
                    .collect(),
            ),
            sequence_low: Some(
                tracks
                    .iter()
                    .map(|t| (t.sequence() & 0xFFFF_FFFF) as u32)
                    .collect(),
            ),
            midi_binding: Some(
                mapper
                    .table()
                    .iter()
                    .map(BindingRecord::from_mapping)
                    .collect(),
            ),
            midi_input_left: ports.input_left.clone(),
            midi_input_right: ports.input_right.clone(),
            midi_output_left: ports.output_left.clone(),
            midi_output_right: ports.output_right.clone(),
        }
    }

    /// Apply the document onto live state, field by field. Present fields
    /// overwrite, absent fields leave prior state alone; there is no
    /// rollback.
    pub fn apply(
        &self,
        core: &mut SequencerCore,
        mapper: &mut MidiMapper,
        ports: &mut PortSelections,
    ) {
        if let Some(actives) = &self.actives {
            for t in 0..TRACK_COUNT {
                if let Some(&active) = actives.get(t) {
                    core.track_mut(t).set_active(active);
                }
            }
        }

        if let Some(lengths) = &self.lengths {
            for t in 0..TRACK_COUNT {
                if let Some(&length) = lengths.get(t) {
                    core.track_mut(t).set_length(length.max(0) as usize);
                }
            }
        }

        // Sequences decode low half first; the hi half shifts onto the
        // low-populated value. Reordering this breaks every patch with
        // steps past 32.
        if let Some(lows) = &self.sequence_low {
            for t in 0..TRACK_COUNT {
                if let Some(&low) = lows.get(t) {
                    core.track_mut(t).set_sequence(u64::from(low));
                }
            }
        }

        if let Some(his) = &self.sequence_hi {
            for t in 0..TRACK_COUNT {
                if let Some(&hi) = his.get(t) {
                    let track = core.track_mut(t);
                    let merged = track.sequence() | (u64::from(hi) << 32);
                    track.set_sequence(merged);
                }
            }
        }

        // After lengths, so the index<length check sees the loaded lengths
        if let Some(indices) = &self.index {
            for t in 0..TRACK_COUNT {
                if let Some(&index) = indices.get(t) {
                    let index = usize::try_from(index).ok();
                    core.track_mut(t).set_index(index);
                }
            }
        }

        if let Some(records) = &self.midi_binding {
            let table = mapper.table_mut();
            table.clear();
            for record in records {
                match record.to_mapping() {
                    // Commit keeps the uniqueness invariants even over a
                    // hand-edited document
                    Some(mapping) => {
                        table.commit(mapping);
                    }
                    None => warn!(
                        "Dropping invalid binding from patch: controller {} note {} cc {} paramId {}",
                        record.controller, record.note, record.cc, record.param_id
                    ),
                }
            }
            debug!("Loaded {} bindings from patch", table.len());
        }

        if let Some(selection) = &self.midi_input_left {
            ports.input_left = Some(selection.clone());
        }
        if let Some(selection) = &self.midi_input_right {
            ports.input_right = Some(selection.clone());
        }
        if let Some(selection) = &self.midi_output_left {
            ports.output_left = Some(selection.clone());
        }
        if let Some(selection) = &self.midi_output_right {
            ports.output_right = Some(selection.clone());
        }
    }

    /// Save to a JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let json = std::fs::read_to_string(path)?;
        let patch = serde_json::from_str(&json)?;
        Ok(patch)
    }
}
