//! MIDI binding table
//!
//! Associates physical controls (a note or CC on one of the two controllers)
//! with panel parameters. The table enforces single ownership three ways:
//! one binding per parameter, one per (controller, note), one per
//! (controller, cc). Conflicts are resolved by evicting the older entry when
//! a new binding is committed.

use crate::params::{self, grid_param};
use crate::queue::ControllerId;
use tracing::debug;

/// One control-to-parameter binding, possibly still under construction
/// during learn mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiMapping {
    pub controller: Option<ControllerId>,
    pub note: Option<u8>,
    pub cc: Option<u8>,
    pub param_id: Option<usize>,
}

impl MidiMapping {
    /// A binding is complete once it names a controller, a parameter, and
    /// exactly one of note/cc
    pub fn is_complete(&self) -> bool {
        self.controller.is_some()
            && self.param_id.is_some()
            && (self.note.is_some() ^ self.cc.is_some())
    }

    pub fn reset(&mut self) {
        *self = MidiMapping::default();
    }
}

/// Committed bindings, capacity reserved up front so learn-commit never
/// reallocates on the processing thread
pub struct MappingTable {
    mappings: Vec<MidiMapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self {
            mappings: Vec::with_capacity(params::MAP_CAPACITY),
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MidiMapping> {
        self.mappings.iter()
    }

    pub fn get(&self, index: usize) -> Option<&MidiMapping> {
        self.mappings.get(index)
    }

    pub fn find_by_param(&self, param_id: usize) -> Option<usize> {
        self.mappings
            .iter()
            .position(|m| m.param_id == Some(param_id))
    }

    pub fn find_by_note(&self, controller: ControllerId, note: u8) -> Option<usize> {
        self.mappings
            .iter()
            .position(|m| m.controller == Some(controller) && m.note == Some(note))
    }

    pub fn find_by_cc(&self, controller: ControllerId, cc: u8) -> Option<usize> {
        self.mappings
            .iter()
            .position(|m| m.controller == Some(controller) && m.cc == Some(cc))
    }

    /// Commit a completed binding, evicting any entry it conflicts with:
    /// same parameter, same (controller, note), or same (controller, cc).
    ///
    /// Returns false (and stores nothing) if the mapping is incomplete.
    pub fn commit(&mut self, mapping: MidiMapping) -> bool {
        if !mapping.is_complete() {
            return false;
        }

        if let Some(param_id) = mapping.param_id {
            if let Some(index) = self.find_by_param(param_id) {
                debug!("Evicting binding for param {} (rebound)", param_id);
                self.mappings.remove(index);
            }
        }

        if let (Some(controller), Some(note)) = (mapping.controller, mapping.note) {
            if let Some(index) = self.find_by_note(controller, note) {
                debug!("Evicting binding for note {}:{} (reassigned)", controller, note);
                self.mappings.remove(index);
            }
        }

        if let (Some(controller), Some(cc)) = (mapping.controller, mapping.cc) {
            if let Some(index) = self.find_by_cc(controller, cc) {
                debug!("Evicting binding for cc {}:{} (reassigned)", controller, cc);
                self.mappings.remove(index);
            }
        }

        self.mappings.push(mapping);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<MidiMapping> {
        if index < self.mappings.len() {
            Some(self.mappings.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.mappings.clear();
    }

    /// Whether the grid button at (column, track) has a committed binding
    pub fn is_grid_mapped(&self, column: usize, track: usize) -> bool {
        self.find_by_param(grid_param(column, track)).is_some()
    }

    /// UI label for a grid button's binding: "controller:note", empty when
    /// unbound
    pub fn describe(&self, column: usize, track: usize) -> String {
        match self
            .find_by_param(grid_param(column, track))
            .and_then(|i| self.mappings.get(i))
        {
            Some(mapping) => match (mapping.controller, mapping.note) {
                (Some(controller), Some(note)) => format!("{}:{}", controller, note),
                _ => String::new(),
            },
            None => String::new(),
        }
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_binding(controller: ControllerId, note: u8, param_id: usize) -> MidiMapping {
        MidiMapping {
            controller: Some(controller),
            note: Some(note),
            cc: None,
            param_id: Some(param_id),
        }
    }

    fn cc_binding(controller: ControllerId, cc: u8, param_id: usize) -> MidiMapping {
        MidiMapping {
            controller: Some(controller),
            note: None,
            cc: Some(cc),
            param_id: Some(param_id),
        }
    }

    #[test]
    fn test_incomplete_rejected() {
        let mut table = MappingTable::new();

        assert!(!table.commit(MidiMapping::default()));

        // Both note and cc set is not a valid binding either
        let mut both = note_binding(ControllerId::Left, 60, 0);
        both.cc = Some(20);
        assert!(!both.is_complete());
        assert!(!table.commit(both));
        assert!(table.is_empty());
    }

    #[test]
    fn test_rebind_param_evicts() {
        let mut table = MappingTable::new();
        table.commit(note_binding(ControllerId::Left, 60, 5));
        table.commit(note_binding(ControllerId::Left, 61, 5));

        assert_eq!(table.len(), 1);
        let m = table.get(table.find_by_param(5).unwrap()).unwrap();
        assert_eq!(m.note, Some(61));
    }

    #[test]
    fn test_reassign_note_evicts() {
        let mut table = MappingTable::new();
        table.commit(note_binding(ControllerId::Left, 60, 5));
        table.commit(note_binding(ControllerId::Left, 60, 6));

        assert_eq!(table.len(), 1);
        assert_eq!(table.find_by_param(5), None);
        assert!(table.find_by_param(6).is_some());
    }

    #[test]
    fn test_same_note_other_controller_coexists() {
        let mut table = MappingTable::new();
        table.commit(note_binding(ControllerId::Left, 60, 5));
        table.commit(note_binding(ControllerId::Right, 60, 6));

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_reassign_cc_evicts() {
        let mut table = MappingTable::new();
        table.commit(cc_binding(ControllerId::Right, 20, 140));
        table.commit(cc_binding(ControllerId::Right, 20, 141));

        assert_eq!(table.len(), 1);
        assert!(table.find_by_param(141).is_some());
    }

    #[test]
    fn test_grid_queries() {
        let mut table = MappingTable::new();
        table.commit(note_binding(ControllerId::Right, 36, grid_param(3, 2)));

        assert!(table.is_grid_mapped(3, 2));
        assert!(!table.is_grid_mapped(4, 2));
        assert_eq!(table.describe(3, 2), "1:36");
        assert_eq!(table.describe(0, 0), "");
    }

    #[test]
    fn test_clear() {
        let mut table = MappingTable::new();
        table.commit(note_binding(ControllerId::Left, 60, 5));
        table.clear();
        assert!(table.is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_binding() -> impl Strategy<Value = MidiMapping> {
            (any::<bool>(), 0u8..128, any::<bool>(), 0usize..crate::params::PARAM_COUNT).prop_map(
                |(right, key, use_cc, param_id)| {
                    let controller = if right {
                        ControllerId::Right
                    } else {
                        ControllerId::Left
                    };
                    if use_cc {
                        cc_binding(controller, key, param_id)
                    } else {
                        note_binding(controller, key, param_id)
                    }
                },
            )
        }

        proptest! {
            /// After any commit sequence the three single-ownership
            /// invariants hold.
            #[test]
            fn commit_preserves_uniqueness(bindings in prop::collection::vec(arb_binding(), 0..64)) {
                let mut table = MappingTable::new();
                for binding in bindings {
                    table.commit(binding);
                }

                let all: Vec<_> = table.iter().copied().collect();
                for (i, a) in all.iter().enumerate() {
                    for b in &all[i + 1..] {
                        prop_assert_ne!(a.param_id, b.param_id);
                        if a.controller == b.controller {
                            if a.note.is_some() {
                                prop_assert_ne!(a.note, b.note);
                            }
                            if a.cc.is_some() {
                                prop_assert_ne!(a.cc, b.cc);
                            }
                        }
                    }
                }
            }

            /// The table never outgrows its reserved capacity while bindings
            /// target learnable params.
            #[test]
            fn table_stays_within_reserve(bindings in prop::collection::vec(arb_binding(), 0..256)) {
                let mut table = MappingTable::new();
                for binding in bindings {
                    table.commit(binding);
                }
                prop_assert!(table.len() <= crate::params::PARAM_COUNT);
            }
        }
    }
}
