//! Persisted module state

pub mod persistence;

pub use persistence::{
    BindingRecord, PatchError, PatchState, PortSelection, PortSelections,
};
