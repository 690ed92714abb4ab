use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

use crate::engine::graph::AudioGraph;
use crate::error::StartupError;
use crate::io::{AudioBackend, StreamFormat};

/// The host's default output device, driven by a cpal stream.
///
/// The render callback owns the audio graph outright; nothing on the audio
/// thread takes a lock the control side can hold.
#[derive(Default)]
pub struct CpalBackend {
    device: Option<Device>,
    config: Option<StreamConfig>,
    stream: Option<Stream>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

impl AudioBackend for CpalBackend {
    fn open(&mut self) -> Result<StreamFormat, StartupError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(StartupError::NoOutputDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|err| StartupError::Config(err.to_string()))?;

        if supported.sample_format() != SampleFormat::F32 {
            return Err(StartupError::UnsupportedFormat {
                format: format!("{:?}", supported.sample_format()),
            });
        }

        let config: StreamConfig = supported.into();
        let format = StreamFormat {
            sample_rate: config.sample_rate.0 as f32,
            channels: config.channels as usize,
        };
        log::debug!(
            "output device opened: {} Hz, {} channels",
            config.sample_rate.0,
            config.channels
        );

        self.device = Some(device);
        self.config = Some(config);
        Ok(format)
    }

    fn run(&mut self, mut graph: AudioGraph) -> Result<(), StartupError> {
        let (Some(device), Some(config)) = (&self.device, &self.config) else {
            return Err(StartupError::Stream("device was not opened".into()));
        };
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [f32], _| graph.render_interleaved(data, channels),
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|err| StartupError::Stream(err.to_string()))?;
        stream
            .play()
            .map_err(|err| StartupError::Play(err.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log::debug!("pausing output stream failed: {err}");
            }
        }
        self.device = None;
        self.config = None;
    }
}
