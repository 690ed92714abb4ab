//! The engine facade: one owner for every node, a fixed lifecycle, and the
//! control-side API the UI talks to.

/*
Lifecycle
=========

        play()/initialize()               dispose()
  Idle ───────────────────→ Running ─────────────────→ Disposing{deadline}
    │                          ↑                            │   │
    │ dispose()                └────────── play() ──────────┘   │ tick() past the
    │                                                           │ deadline, or drop
    └──────────────────────────→ Released ←─────────────────────┘

Initialization builds every node exactly once and hands the finished
`AudioGraph` to the backend. If the backend cannot start, the graph is dropped
on the spot and the error goes back to the caller; nothing is retried.

`dispose()` stops playback at once but only releases the nodes after a short
grace period (100 ms by default), so release tails are not cut off. The
release itself runs on the first `tick()` after the deadline, or when the
engine is dropped. A `play()` inside the grace period cancels the disposal.

Released is terminal. Every call after that is a silent no-op; `play()` does
not bring the engine back.

Threads
=======

  control (this struct) ──EngineCommand──rtrb──→ AudioGraph (backend callback)
  display (tick)        ←──BeatEvent─────rtrb──┘
                        ←──waveform / beat window (try_lock taps)

The control side never touches a node directly. Config changes are merged
here, clamped, and only the parts that changed are sent down.
*/

pub mod command;
pub mod graph;
pub mod scheduler;

use std::time::{Duration, Instant};

use rtrb::{Producer, RingBuffer};

use crate::analysis::{AnalysisReader, WAVEFORM_WINDOW};
use crate::beat::{beat_channel, BeatBroadcaster, BeatSubscription};
use crate::config::{ConfigPatch, DrumChange, DrumConfig, SoundParameters, TimbreChange, TimbreConfig};
use crate::error::StartupError;
use crate::graph::reverb::ReverbNode;
use crate::io::AudioBackend;

use self::command::EngineCommand;
use self::graph::{AudioGraph, GraphTaps};

pub const DEFAULT_GRACE: Duration = Duration::from_millis(100);
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;
pub const DEFAULT_BEAT_CAPACITY: usize = 64;

/// Builder-style engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub grace: Duration,
    pub command_capacity: usize,
    pub beat_capacity: usize,
    pub timbre: TimbreConfig,
    pub drums: DrumConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            beat_capacity: DEFAULT_BEAT_CAPACITY,
            timbre: TimbreConfig::default(),
            drums: DrumConfig::default(),
        }
    }
}

impl EngineSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay between `dispose()` and the release of the nodes.
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    pub fn beat_capacity(mut self, capacity: usize) -> Self {
        self.beat_capacity = capacity.max(1);
        self
    }

    pub fn timbre(mut self, timbre: TimbreConfig) -> Self {
        self.timbre = timbre;
        self
    }

    pub fn drums(mut self, drums: DrumConfig) -> Self {
        self.drums = drums;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Disposing { deadline: Instant },
    Released,
}

/// Control-side handles into a running graph.
struct Session {
    commands: Producer<EngineCommand>,
    taps: GraphTaps,
    sample_rate: f32,
}

impl Session {
    fn send(&mut self, command: EngineCommand) {
        if let Err(err) = self.commands.push(command) {
            log::warn!("command queue full, dropping {:?}", err);
        }
    }

    fn audio_time(&self) -> f64 {
        let frames = self.taps.clock.load(std::sync::atomic::Ordering::Acquire);
        frames as f64 / self.sample_rate as f64
    }
}

pub struct Engine<B: AudioBackend> {
    backend: B,
    settings: EngineSettings,
    lifecycle: Lifecycle,
    session: Option<Session>,
    broadcaster: BeatBroadcaster,
    timbre: TimbreConfig,
    drums: DrumConfig,
    volume: Option<f32>,
    muted: bool,
}

impl<B: AudioBackend> Engine<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, EngineSettings::default())
    }

    pub fn with_settings(backend: B, settings: EngineSettings) -> Self {
        let mut timbre = TimbreConfig::default();
        timbre.merge(&ConfigPatch::timbre(&settings.timbre));
        let mut drums = DrumConfig::default();
        drums.merge(&ConfigPatch {
            drum_pattern: Some(settings.drums.pattern),
            tempo: Some(settings.drums.tempo),
            drum_volume: Some(settings.drums.volume),
            drum_filter: Some(settings.drums.filter),
            ..ConfigPatch::default()
        });

        Self {
            backend,
            settings,
            lifecycle: Lifecycle::Idle,
            session: None,
            broadcaster: BeatBroadcaster::new(),
            timbre,
            drums,
            volume: None,
            muted: false,
        }
    }

    /// Build the graph and start the backend. Does nothing when already
    /// initialized (or released).
    pub fn initialize(&mut self) -> Result<(), StartupError> {
        match self.lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Released => {
                log::debug!("initialize after release ignored");
                return Ok(());
            }
            Lifecycle::Running | Lifecycle::Disposing { .. } => return Ok(()),
        }

        let format = self.backend.open()?;

        let (commands, command_consumer) = RingBuffer::new(self.settings.command_capacity);
        let (publisher, beat_consumer) = beat_channel(self.settings.beat_capacity);
        let (graph, taps) = AudioGraph::new(
            format.sample_rate,
            &self.timbre,
            &self.drums,
            command_consumer,
            publisher,
        );

        if let Err(err) = self.backend.run(graph) {
            log::warn!("audio backend failed to start: {err}");
            self.backend.close();
            return Err(err);
        }

        self.broadcaster.attach(beat_consumer);
        let mut session = Session {
            commands,
            taps,
            sample_rate: format.sample_rate,
        };
        if let Some(level) = self.volume {
            session.send(EngineCommand::SetVolume(level));
        }
        if self.muted {
            session.send(EngineCommand::SetMuted(true));
        }
        self.session = Some(session);
        self.lifecycle = Lifecycle::Running;

        log::debug!(
            "engine initialized at {} Hz, {} channels",
            format.sample_rate,
            format.channels
        );
        Ok(())
    }

    /// Replace whatever is sounding with a chord for `params`. Initializes the
    /// engine first if needed, and cancels a pending dispose.
    pub fn play(&mut self, params: SoundParameters) -> Result<(), StartupError> {
        match self.lifecycle {
            Lifecycle::Released => {
                log::debug!("play after release ignored");
                return Ok(());
            }
            Lifecycle::Disposing { .. } => {
                log::debug!("play cancelled pending dispose");
                self.lifecycle = Lifecycle::Running;
            }
            Lifecycle::Idle => self.initialize()?,
            Lifecycle::Running => {}
        }

        self.send(EngineCommand::Play(params));
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::Released {
            log::debug!("stop after release ignored");
            return;
        }
        self.send(EngineCommand::Stop);
    }

    /// Output level from a [0, 1] slider position.
    pub fn set_volume(&mut self, level: f32) {
        if self.lifecycle == Lifecycle::Released {
            log::debug!("set_volume after release ignored");
            return;
        }
        if !level.is_finite() {
            return;
        }
        let level = level.clamp(0.0, 1.0);
        self.volume = Some(level);
        self.send(EngineCommand::SetVolume(level));
    }

    pub fn mute(&mut self) {
        self.set_muted(true);
    }

    pub fn unmute(&mut self) {
        self.set_muted(false);
    }

    fn set_muted(&mut self, muted: bool) {
        if self.lifecycle == Lifecycle::Released {
            log::debug!("mute change after release ignored");
            return;
        }
        self.muted = muted;
        self.send(EngineCommand::SetMuted(muted));
    }

    /// Merge a partial config, clamping every field. Only the parts that
    /// changed are sent to the audio side.
    pub fn set_config(&mut self, patch: ConfigPatch) -> (TimbreChange, DrumChange) {
        if self.lifecycle == Lifecycle::Released {
            log::debug!("set_config after release ignored");
            return Default::default();
        }

        let timbre_change = self.timbre.merge(&patch);
        let drum_change = self.drums.merge(&patch);

        if timbre_change.changed {
            let reverb = match (timbre_change.decay_changed, &self.session) {
                (true, Some(session)) => Some(
                    ReverbNode::new(
                        self.timbre.reverb_decay,
                        self.timbre.reverb_wet,
                        session.sample_rate,
                    )
                    .map(Box::new),
                ),
                _ => None,
            };
            self.send(EngineCommand::SetTimbre {
                config: self.timbre,
                reverb,
            });
        }
        if drum_change.any() {
            self.send(EngineCommand::SetDrums {
                config: self.drums,
                change: drum_change,
            });
        }

        (timbre_change, drum_change)
    }

    pub fn register_beat_callback<F>(&self, callback: F) -> BeatSubscription
    where
        F: Fn(f64, f32) + Send + Sync + 'static,
    {
        self.broadcaster.register(callback)
    }

    /// Latest 128-sample kit window, `None` before initialization and after
    /// release.
    pub fn beat_energy_window(&self) -> Option<Vec<f32>> {
        self.session.as_ref().map(|s| s.taps.beat_window.read())
    }

    /// Latest 1024-sample output window (a flat line when nothing runs).
    pub fn waveform(&self) -> Vec<f32> {
        match &self.session {
            Some(session) => session.taps.waveform.read(),
            None => vec![0.0; WAVEFORM_WINDOW],
        }
    }

    pub fn waveform_reader(&self) -> Option<AnalysisReader> {
        self.session.as_ref().map(|s| s.taps.waveform.clone())
    }

    pub fn beat_energy(&self) -> f32 {
        self.broadcaster.energy()
    }

    /// Audio-clock time in seconds (0 before initialization).
    pub fn audio_time(&self) -> f64 {
        self.session.as_ref().map_or(0.0, Session::audio_time)
    }

    /// Sample rate of the running stream.
    pub fn sample_rate(&self) -> Option<f32> {
        self.session.as_ref().map(|s| s.sample_rate)
    }

    /// One display-clock frame: finish a due dispose, then drain beats, decay
    /// the energy and run implicit detection.
    pub fn tick(&mut self) -> usize {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> usize {
        if let Lifecycle::Disposing { deadline } = self.lifecycle {
            if now >= deadline {
                self.release();
            }
        }

        match &self.session {
            Some(session) => {
                let window = session.taps.beat_window.read();
                self.broadcaster.tick(Some(&window), session.audio_time())
            }
            None => self.broadcaster.tick(None, 0.0),
        }
    }

    /// Stop playback now and release the nodes after the grace period.
    pub fn dispose(&mut self) {
        self.dispose_at(Instant::now());
    }

    pub fn dispose_at(&mut self, now: Instant) {
        match self.lifecycle {
            Lifecycle::Idle => {
                log::debug!("dispose before initialize");
                self.lifecycle = Lifecycle::Released;
            }
            Lifecycle::Running => {
                self.send(EngineCommand::Stop);
                self.lifecycle = Lifecycle::Disposing {
                    deadline: now + self.settings.grace,
                };
            }
            Lifecycle::Disposing { .. } | Lifecycle::Released => {}
        }
    }

    fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.send(EngineCommand::Dispose);
        }
        self.backend.close();
        self.broadcaster.detach();
        self.lifecycle = Lifecycle::Released;
        log::debug!("engine released");
    }

    fn send(&mut self, command: EngineCommand) {
        if let Some(session) = &mut self.session {
            session.send(command);
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.lifecycle == Lifecycle::Released
    }

    /// The active timbre after every merge so far.
    pub fn timbre(&self) -> TimbreConfig {
        self.timbre
    }

    pub fn drums(&self) -> DrumConfig {
        self.drums
    }

    pub fn volume(&self) -> Option<f32> {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: AudioBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        if matches!(
            self.lifecycle,
            Lifecycle::Running | Lifecycle::Disposing { .. }
        ) {
            self.release();
        }
    }
}
