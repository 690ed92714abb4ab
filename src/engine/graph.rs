//! Everything that runs on the audio clock, in one owned value.
//!
//! The backend moves an [`AudioGraph`] into its render callback. Each block:
//!
//! 1. drain control commands,
//! 2. advance the sequencer to the end of the block (hits go to the kit,
//!    kick beats to the beat ring),
//! 3. render the voice bank through the signal chain,
//! 4. render the kit and sum it in.
//!
//! The graph never blocks: commands and beats use rtrb rings, and the
//! analysis taps only `try_lock`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::Consumer;

use crate::analysis::AnalysisReader;
use crate::beat::BeatPublisher;
use crate::chain::SignalChain;
use crate::config::{DrumConfig, SoundParameters, TimbreConfig};
use crate::drums::DrumKit;
use crate::engine::command::EngineCommand;
use crate::sequencing::pattern::{DrumVoice, PatternKind};
use crate::sequencing::sequencer::{StepSequencer, StepTarget};
use crate::synth::bank::VoiceBank;
use crate::MAX_BLOCK_SIZE;

/// Reader ends handed back to the control side when a graph is built.
pub struct GraphTaps {
    pub waveform: AnalysisReader,
    pub beat_window: AnalysisReader,
    /// Frames rendered so far.
    pub clock: Arc<AtomicU64>,
}

/// Routes sequencer output: hits to the kit, kick beats to the beat ring.
struct KitTarget<'a> {
    kit: &'a mut DrumKit,
    beats: &'a mut BeatPublisher,
}

impl StepTarget for KitTarget<'_> {
    fn trigger(&mut self, voice: DrumVoice, time: f64) {
        self.kit.trigger(voice, time);
    }

    fn beat(&mut self, time: f64, velocity: f32) {
        self.beats.publish(time, velocity);
    }
}

pub struct AudioGraph {
    commands: Consumer<EngineCommand>,
    beats: BeatPublisher,
    bank: VoiceBank,
    chain: SignalChain,
    kit: DrumKit,
    sequencer: StepSequencer,
    timbre: TimbreConfig,
    drums: DrumConfig,
    sample_rate: f32,
    frame: u64,
    clock: Arc<AtomicU64>,
    render_buf: Vec<f32>,
    drum_buf: Vec<f32>,
    /// Between a `Play` and the next `Stop`.
    playing: bool,
    disposed: bool,
}

impl AudioGraph {
    pub fn new(
        sample_rate: f32,
        timbre: &TimbreConfig,
        drums: &DrumConfig,
        commands: Consumer<EngineCommand>,
        beats: BeatPublisher,
    ) -> (Self, GraphTaps) {
        let (chain, waveform) = SignalChain::new(sample_rate, timbre);
        let (kit, beat_window) = DrumKit::new(sample_rate, drums);
        let clock = Arc::new(AtomicU64::new(0));

        let mut sequencer = StepSequencer::new();
        sequencer.load(drums.pattern, drums.tempo);

        let graph = Self {
            commands,
            beats,
            bank: VoiceBank::new(sample_rate, timbre),
            chain,
            kit,
            sequencer,
            timbre: *timbre,
            drums: *drums,
            sample_rate,
            frame: 0,
            clock: Arc::clone(&clock),
            render_buf: vec![0.0; MAX_BLOCK_SIZE],
            drum_buf: vec![0.0; MAX_BLOCK_SIZE],
            playing: false,
            disposed: false,
        };
        let taps = GraphTaps {
            waveform,
            beat_window,
            clock,
        };
        (graph, taps)
    }

    /// Audio-clock time of the next block, in seconds.
    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Render a mono block of any length, [`MAX_BLOCK_SIZE`] frames at a
    /// time.
    pub fn render_block(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        self.drain_commands();

        let n = out.len();
        if self.disposed {
            out.fill(0.0);
            self.advance_clock(n);
            return;
        }

        let block_end = (self.frame + n as u64) as f64 / self.sample_rate as f64;
        let mut target = KitTarget {
            kit: &mut self.kit,
            beats: &mut self.beats,
        };
        self.sequencer.advance(block_end, &mut target);

        let modulation = self.bank.render(out);
        self.chain.render(out, modulation);

        let drums = &mut self.drum_buf[..n];
        self.kit.render(drums);
        for (o, d) in out.iter_mut().zip(drums.iter()) {
            *o += d;
        }

        self.advance_clock(n);
    }

    /// Fill an interleaved device buffer, copying the mono signal to every
    /// channel.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let total_frames = data.len() / channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

            let mut block = std::mem::take(&mut self.render_buf);
            self.render_chunk(&mut block[..frames]);

            let out_off = frames_written * channels;
            for (i, &s) in block[..frames].iter().enumerate() {
                let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                frame.fill(s);
            }
            self.render_buf = block;

            frames_written += frames;
        }
    }

    fn advance_clock(&mut self, frames: usize) {
        self.frame += frames as u64;
        self.clock.store(self.frame, Ordering::Release);
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: EngineCommand) {
        if self.disposed {
            return;
        }

        match command {
            EngineCommand::Play(params) => self.play(params),
            EngineCommand::Stop => self.stop(),
            EngineCommand::SetTimbre { config, reverb } => {
                if let Some(reverb) = reverb {
                    self.chain.install_reverb(config.reverb_decay, reverb);
                }
                self.chain.configure(&config);
                self.bank.configure(&config);
                self.timbre = config;
            }
            EngineCommand::SetDrums { config, change } => {
                if change.bus_changed {
                    self.kit.set_bus_volume(config.volume);
                    self.kit.set_bus_filter(config.filter);
                }
                if change.tempo_changed {
                    self.sequencer.set_tempo(config.tempo);
                    self.kit.set_tempo(config.tempo);
                }
                if change.pattern_changed {
                    self.sequencer.load(config.pattern, config.tempo);
                    if config.pattern == PatternKind::None {
                        self.kit.cancel_pending();
                    } else if self.playing {
                        self.kit.set_tempo(config.tempo);
                        self.sequencer.start(self.now());
                    }
                }
                self.drums = config;
            }
            EngineCommand::SetVolume(level) => self.chain.set_volume(level),
            EngineCommand::SetMuted(muted) => {
                self.chain.set_muted(muted);
                self.kit.set_muted(muted);
            }
            EngineCommand::Dispose => self.dispose(),
        }
    }

    fn play(&mut self, params: SoundParameters) {
        self.stop();

        self.chain.set_resonance(params.resonance);
        self.chain.set_cutoff(self.timbre.filter_frequency);

        if self.timbre.oscillator_enabled {
            self.bank.trigger_modulator(params.modulation);
            self.bank.trigger(params.chord(self.timbre.harmonicity));
        }

        if self.drums.pattern != PatternKind::None {
            self.sequencer.load(self.drums.pattern, self.drums.tempo);
            self.kit.set_tempo(self.drums.tempo);
            self.sequencer.start(self.now());
        }
        self.playing = true;
        log::debug!("play {:.1} Hz at t={:.3}", params.frequency, self.now());
    }

    fn stop(&mut self) {
        self.playing = false;
        self.bank.release();
        self.sequencer.stop();
        self.kit.cancel_pending();
    }

    fn dispose(&mut self) {
        self.bank.free_all();
        self.chain.dispose();
        self.kit.reset();
        self.sequencer.stop();
        self.playing = false;
        self.disposed = true;
        log::debug!("audio graph released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::beat_channel;
    use rtrb::{Producer, RingBuffer};

    const SR: f32 = 48_000.0;

    fn graph(drums: DrumConfig) -> (AudioGraph, GraphTaps, Producer<EngineCommand>, Consumer<crate::beat::BeatEvent>) {
        let (commands, consumer) = RingBuffer::new(16);
        let (publisher, beats) = beat_channel(64);
        let (graph, taps) = AudioGraph::new(SR, &TimbreConfig::default(), &drums, consumer, publisher);
        (graph, taps, commands, beats)
    }

    #[test]
    fn play_reaches_the_output() {
        let (mut graph, taps, mut commands, _) = graph(DrumConfig::default());
        commands
            .push(EngineCommand::Play(SoundParameters::new(220.0, 2.0, 0.5)))
            .unwrap();

        let mut out = vec![0.0; 48_000];
        graph.render_interleaved(&mut out, 1);

        assert!(out[24_000..].iter().any(|s| s.abs() > 0.01));
        assert!(taps.waveform.read().iter().any(|s| s.abs() > 0.0));
        assert_eq!(taps.clock.load(Ordering::Acquire), 48_000);
    }

    #[test]
    fn play_with_pattern_publishes_kick_beats() {
        let drums = DrumConfig {
            pattern: PatternKind::FourOnFloor,
            tempo: 120.0,
            ..DrumConfig::default()
        };
        let (mut graph, _, mut commands, mut beats) = graph(drums);
        commands
            .push(EngineCommand::Play(SoundParameters::new(220.0, 2.0, 0.5)))
            .unwrap();

        // two seconds at 120 BPM: one kick per beat
        let mut out = vec![0.0; 512];
        for _ in 0..(2 * 48_000 / 512) {
            graph.render_block(&mut out);
        }

        let mut times = Vec::new();
        while let Ok(event) = beats.pop() {
            times.push(event.time);
        }
        assert_eq!(times.len(), 4);
        assert!((times[1] - times[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pattern_chosen_while_playing_starts_the_drums() {
        let drums = DrumConfig {
            tempo: 120.0,
            ..DrumConfig::default()
        };
        let (mut graph, _, mut commands, mut beats) = graph(drums);
        commands
            .push(EngineCommand::Play(SoundParameters::new(220.0, 2.0, 0.5)))
            .unwrap();
        let mut out = vec![0.0; 512];
        graph.render_block(&mut out);
        assert!(graph.is_playing());
        assert!(!graph.sequencer().is_running());

        let config = DrumConfig {
            pattern: PatternKind::FourOnFloor,
            ..drums
        };
        let change = crate::config::DrumChange {
            pattern_changed: true,
            ..Default::default()
        };
        commands.push(EngineCommand::SetDrums { config, change }).unwrap();
        graph.render_block(&mut out);

        assert!(graph.sequencer().is_running());
        assert!(beats.pop().is_ok());
    }

    #[test]
    fn pattern_chosen_while_stopped_waits_for_play() {
        let (mut graph, _, mut commands, mut beats) = graph(DrumConfig::default());
        let config = DrumConfig {
            pattern: PatternKind::Dub,
            ..DrumConfig::default()
        };
        let change = crate::config::DrumChange {
            pattern_changed: true,
            ..Default::default()
        };
        commands.push(EngineCommand::SetDrums { config, change }).unwrap();

        let mut out = vec![0.0; 4096];
        graph.render_block(&mut out);
        assert!(!graph.sequencer().is_running());
        assert!(beats.pop().is_err());
    }

    #[test]
    fn oversized_blocks_render_in_chunks() {
        let (mut graph, taps, mut commands, _) = graph(DrumConfig::default());
        commands
            .push(EngineCommand::Play(SoundParameters::new(220.0, 2.0, 0.5)))
            .unwrap();

        let mut out = vec![0.0; 3 * MAX_BLOCK_SIZE + 17];
        graph.render_block(&mut out);

        assert_eq!(taps.clock.load(Ordering::Acquire), out.len() as u64);
        assert!(out[2 * MAX_BLOCK_SIZE..].iter().any(|s| s.abs() > 0.0));
    }

    #[test]
    fn interleaved_copies_mono_to_every_channel() {
        let (mut graph, _, mut commands, _) = graph(DrumConfig::default());
        commands
            .push(EngineCommand::Play(SoundParameters::new(330.0, 0.0, 0.0)))
            .unwrap();

        let mut data = vec![0.0; 2 * 4096];
        graph.render_interleaved(&mut data, 2);
        for frame in data.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn dispose_renders_silence() {
        let (mut graph, _, mut commands, _) = graph(DrumConfig::default());
        commands
            .push(EngineCommand::Play(SoundParameters::new(220.0, 2.0, 0.5)))
            .unwrap();
        let mut out = vec![0.0; 1024];
        graph.render_block(&mut out);

        commands.push(EngineCommand::Dispose).unwrap();
        graph.render_block(&mut out);
        assert!(graph.is_disposed());
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
