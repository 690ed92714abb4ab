use crate::engine::graph::AudioGraph;
use crate::error::StartupError;
use crate::io::{AudioBackend, StreamFormat};

/// Renders on demand into memory instead of to a device.
///
/// Nothing happens between `render` calls, so the audio clock only moves when
/// the caller asks it to. Used by tests, benches and anything that wants the
/// engine's output as samples.
pub struct OfflineBackend {
    format: StreamFormat,
    graph: Option<AudioGraph>,
    failure: Option<StartupError>,
    closed: usize,
}

impl OfflineBackend {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            format: StreamFormat {
                sample_rate,
                channels: 1,
            },
            graph: None,
            failure: None,
            closed: 0,
        }
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.format.channels = channels.max(1);
        self
    }

    /// A backend whose `open` always fails with `error` (a machine with no
    /// output device, say).
    pub fn failing(error: StartupError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(48_000.0)
        }
    }

    /// Render `frames` frames, interleaved. Silence when no graph is running.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut data = vec![0.0; frames * self.format.channels];
        if let Some(graph) = &mut self.graph {
            graph.render_interleaved(&mut data, self.format.channels);
        }
        data
    }

    /// Render `seconds` of audio.
    pub fn render_seconds(&mut self, seconds: f32) -> Vec<f32> {
        let frames = (seconds.max(0.0) * self.format.sample_rate) as usize;
        self.render(frames)
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn is_running(&self) -> bool {
        self.graph.is_some()
    }

    /// How many times `close` has dropped a running graph.
    pub fn close_count(&self) -> usize {
        self.closed
    }
}

impl AudioBackend for OfflineBackend {
    fn open(&mut self) -> Result<StreamFormat, StartupError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.format),
        }
    }

    fn run(&mut self, graph: AudioGraph) -> Result<(), StartupError> {
        self.graph = Some(graph);
        Ok(())
    }

    fn close(&mut self) {
        if self.graph.take().is_some() {
            self.closed += 1;
        }
    }
}
