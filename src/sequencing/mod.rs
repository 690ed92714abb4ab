//! Drum patterns and the step sequencer that plays them.

pub mod pattern;
pub mod sequencer;

pub use pattern::{DrumVoice, Pattern, PatternKind, Step};
pub use sequencer::{SequencerState, StepSequencer, StepTarget};
