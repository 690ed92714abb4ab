//! App state and the display loop.
//!
//! The loop here is the display clock: every frame it ticks the engine (beat
//! energy, implicit detection, pending dispose), reads the analysis windows
//! and redraws.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ambient_dsp::analysis::WAVEFORM_WINDOW;
use ambient_dsp::{
    BeatSubscription, ConfigPatch, CpalBackend, Engine, PatternKind, SoundParameters,
};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::presets::Preset;
use crate::ui::{self, spectrum::SpectrumAnalyzer, ViewState};

const FRAME: Duration = Duration::from_millis(16);
const VOLUME_STEP: f32 = 0.05;
const TEMPO_STEP: f32 = 5.0;
const VALUE_STEP: f32 = 2.0;

/// Startup options from the command line.
pub struct Settings {
    pub preset: Preset,
    pub pattern: PatternKind,
    pub tempo: f32,
    pub value: f32,
    pub intensity: f32,
    pub mood: f32,
    pub volume: f32,
    pub autoplay: bool,
}

pub struct App {
    engine: Engine<CpalBackend>,
    spectrum: SpectrumAnalyzer,
    preset: Preset,
    value: f32,
    intensity: f32,
    mood: f32,
    volume: f32,
    muted: bool,
    playing: bool,
    beats: Arc<AtomicUsize>,
    subscription: Option<BeatSubscription>,
    should_quit: bool,
}

/// Map an input reading onto play parameters.
fn sound_parameters(value: f32, intensity: f32, mood: f32) -> SoundParameters {
    SoundParameters::new(200.0 + value * 5.0, intensity * 10.0, mood / 10.0)
}

impl App {
    pub fn new(settings: Settings) -> EyreResult<Self> {
        let mut engine = Engine::new(CpalBackend::new());
        engine.set_config(
            settings
                .preset
                .patch()
                .drum_pattern(settings.pattern)
                .tempo(settings.tempo),
        );
        engine
            .initialize()
            .wrap_err("failed to start audio output")?;
        engine.set_volume(settings.volume);

        let beats = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&beats);
        let subscription = engine.register_beat_callback(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let sample_rate = engine.sample_rate().unwrap_or(48_000.0);
        let mut app = Self {
            engine,
            spectrum: SpectrumAnalyzer::new(WAVEFORM_WINDOW, sample_rate),
            preset: settings.preset,
            value: settings.value.clamp(0.0, 100.0),
            intensity: settings.intensity.clamp(0.0, 1.0),
            mood: settings.mood.clamp(0.0, 100.0),
            volume: settings.volume.clamp(0.0, 1.0),
            muted: false,
            playing: false,
            beats,
            subscription: Some(subscription),
            should_quit: false,
        };

        if settings.autoplay {
            app.play()?;
        }
        Ok(app)
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.engine.tick();

            let waveform = self.engine.waveform();
            self.spectrum.update(&waveform);

            let view = ViewState {
                preset: self.preset.name(),
                pattern: self.engine.drums().pattern,
                tempo: self.engine.drums().tempo,
                frequency: sound_parameters(self.value, self.intensity, self.mood).frequency,
                volume: self.volume,
                muted: self.muted,
                playing: self.playing,
                energy: self.engine.beat_energy(),
                beats: self.beats.load(Ordering::Relaxed),
                waveform: &waveform,
                spectrum: self.spectrum.data(),
            };
            terminal.draw(|frame| ui::render(frame, &view))?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code)?;
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) -> EyreResult<()> {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                if self.playing {
                    self.engine.stop();
                    self.playing = false;
                } else {
                    self.play()?;
                }
            }
            KeyCode::Char('p') => {
                let next = self.engine.drums().pattern.next();
                self.engine.set_config(ConfigPatch::new().drum_pattern(next));
            }
            KeyCode::Char('[') => self.nudge_tempo(-TEMPO_STEP),
            KeyCode::Char(']') => self.nudge_tempo(TEMPO_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_volume(VOLUME_STEP),
            KeyCode::Char('-') => self.nudge_volume(-VOLUME_STEP),
            KeyCode::Char('m') => {
                self.muted = !self.muted;
                if self.muted {
                    self.engine.mute();
                } else {
                    self.engine.unmute();
                }
            }
            KeyCode::Up => self.nudge_value(VALUE_STEP)?,
            KeyCode::Down => self.nudge_value(-VALUE_STEP)?,
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.preset = Preset::ALL[index];
                self.engine.set_config(self.preset.patch());
            }
            _ => {}
        }
        Ok(())
    }

    fn play(&mut self) -> EyreResult<()> {
        self.engine
            .play(sound_parameters(self.value, self.intensity, self.mood))
            .wrap_err("failed to start playback")?;
        self.playing = true;
        Ok(())
    }

    fn nudge_tempo(&mut self, delta: f32) {
        let tempo = self.engine.drums().tempo + delta;
        self.engine.set_config(ConfigPatch::new().tempo(tempo));
    }

    fn nudge_volume(&mut self, delta: f32) {
        self.volume = (self.volume + delta).clamp(0.0, 1.0);
        self.engine.set_volume(self.volume);
    }

    /// Move the input reading; a playing chord is replaced at the new pitch.
    fn nudge_value(&mut self, delta: f32) -> EyreResult<()> {
        self.value = (self.value + delta).clamp(0.0, 100.0);
        if self.playing {
            self.play()?;
        }
        Ok(())
    }

    /// Dispose and keep ticking until the grace period has run out, so the
    /// release tails are heard and the stream closes cleanly.
    fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unregister();
        }
        self.engine.dispose();
        while !self.engine.is_released() {
            std::thread::sleep(FRAME);
            self.engine.tick();
        }
    }
}
