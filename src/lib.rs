pub mod analysis; // Audio → display sample windows
pub mod beat; // Beat energy and subscriber callbacks
pub mod chain; // Filter → reverb → output gain
pub mod config;
pub mod drums; // Percussion kit
pub mod dsp;
pub mod engine; // Facade, audio graph, commands
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io;
pub mod sequencing; // Drum patterns and the step sequencer
pub mod synth; // Voice management and polyphony
pub mod voices;

pub use beat::{BeatBroadcaster, BeatEvent, BeatSubscription};
pub use config::{ConfigPatch, DrumConfig, OscillatorType, SoundParameters, TimbreConfig};
pub use dsp::filter::FilterType;
pub use engine::{Engine, EngineSettings, Lifecycle};
pub use error::{GraphError, StartupError};
pub use io::{AudioBackend, CpalBackend, OfflineBackend, StreamFormat};
pub use sequencing::PatternKind;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
