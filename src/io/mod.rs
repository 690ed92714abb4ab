// Purpose - where the audio graph meets an output: a sound device or a buffer

pub mod device;
pub mod offline;

pub use device::CpalBackend;
pub use offline::OfflineBackend;

use crate::engine::graph::AudioGraph;
use crate::error::StartupError;

/// Shape of the stream a backend renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub sample_rate: f32,
    pub channels: usize,
}

/// An output the engine can hand its audio graph to.
///
/// `open` runs first and reports the format the graph must be built for.
/// `run` takes ownership of the graph and starts rendering; if it fails, the
/// graph is dropped with the error. `close` stops rendering and drops the
/// graph. It must be safe to call at any time, including more than once.
pub trait AudioBackend {
    fn open(&mut self) -> Result<StreamFormat, StartupError>;

    fn run(&mut self, graph: AudioGraph) -> Result<(), StartupError>;

    fn close(&mut self);
}
