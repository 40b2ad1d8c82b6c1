//! # gridseq
//!
//! Multi-track step sequencer core with MIDI learn and pad-grid feedback.
//!
//! The crate is built around a single-threaded process cycle: inbound MIDI
//! from up to two grid controllers is drained from bounded queues, routed
//! through a learnable mapping table onto panel parameters, the sequencer
//! engine advances its tracks, and pad LEDs are lit back over MIDI to
//! mirror the sequence, loop points, and play position. A separate
//! aggregator bank merges 14-bit MSB/LSB CC pairs for high-resolution
//! controllers.
//!
//! Hosts drive [`GridSeqModule::process`] once per audio-processing cycle;
//! nothing in that path blocks or allocates. Device IO lives in [`driver`],
//! persistence in [`state`].

pub mod aggregator;
pub mod driver;
pub mod mapper;
pub mod mapping;
pub mod midi;
pub mod module;
pub mod output;
pub mod params;
pub mod queue;
pub mod sequencer;
pub mod state;
pub mod track;
pub mod trigger;

pub use aggregator::{AggregatorMode, CcAggregatorBank, FourteenBit};
pub use mapper::{CycleOutcome, MidiMapper, Mode};
pub use mapping::{MappingTable, MidiMapping};
pub use midi::Message;
pub use module::GridSeqModule;
pub use output::{CaptureSink, FeedbackOutput, MidiSink};
pub use queue::{ControllerId, InputQueue};
pub use sequencer::{ControlFlags, SequencerCore};
pub use state::{PatchError, PatchState, PortSelection, PortSelections};
pub use track::Track;
