//! Sound configuration: what the UI edits and what a play call carries.
//!
//! Both configs are only ever changed through [`ConfigPatch`], which merges
//! field by field and clamps every value into range. Out-of-range input is
//! clamped, never rejected; a non-finite number leaves the field as it was.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::OscillatorWaveform;
use crate::sequencing::pattern::PatternKind;
use crate::sequencing::sequencer::{DEFAULT_TEMPO, MAX_TEMPO, MIN_TEMPO};

pub const FILTER_FREQUENCY_RANGE: (f32, f32) = (20.0, 20_000.0);
pub const REVERB_DECAY_RANGE: (f32, f32) = (0.1, 20.0);
pub const ATTACK_RANGE: (f32, f32) = (0.001, 10.0);
pub const RELEASE_RANGE: (f32, f32) = (0.001, 30.0);
pub const HARMONICITY_RANGE: (f32, f32) = (0.0, 16.0);
pub const TEMPO_RANGE: (f32, f32) = (MIN_TEMPO, MAX_TEMPO);
pub const DRUM_FILTER_RANGE: (f32, f32) = (100.0, 8_000.0);
pub const UNIT_RANGE: (f32, f32) = (0.0, 1.0);

/// Ratio of the chord's third note to the root (a perfect fifth).
pub const FIFTH: f32 = 1.5;

fn merge(current: f32, update: Option<f32>, (lo, hi): (f32, f32)) -> f32 {
    match update {
        Some(v) if v.is_finite() => v.clamp(lo, hi),
        _ => current,
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorType {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl OscillatorType {
    pub fn waveform(self) -> OscillatorWaveform {
        match self {
            OscillatorType::Sine => OscillatorWaveform::Sine,
            OscillatorType::Square => OscillatorWaveform::Square,
            OscillatorType::Sawtooth => OscillatorWaveform::Saw,
            OscillatorType::Triangle => OscillatorWaveform::Triangle,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OscillatorType::Sine => "sine",
            OscillatorType::Square => "square",
            OscillatorType::Sawtooth => "sawtooth",
            OscillatorType::Triangle => "triangle",
        }
    }
}

/// Per-play input.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundParameters {
    /// Chord root in Hz.
    pub frequency: f32,
    /// Modulator rate in Hz.
    pub modulation: f32,
    pub resonance: f32,
}

impl SoundParameters {
    pub fn new(frequency: f32, modulation: f32, resonance: f32) -> Self {
        Self {
            frequency,
            modulation,
            resonance,
        }
    }

    /// Filter Q for this call: `clamp(resonance + 5, 0.1, 10)`.
    pub fn filter_q(&self) -> f32 {
        resonance_to_q(self.resonance)
    }

    /// `[f, f × harmonicity, f × 1.5]`
    pub fn chord(&self, harmonicity: f32) -> [f32; 3] {
        let f = self.frequency;
        [f, f * harmonicity, f * FIFTH]
    }
}

pub fn resonance_to_q(resonance: f32) -> f32 {
    if resonance.is_finite() {
        (resonance + 5.0).clamp(0.1, 10.0)
    } else {
        crate::dsp::filter::DEFAULT_Q
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimbreConfig {
    pub oscillator_enabled: bool,
    pub oscillator_type: OscillatorType,
    pub filter_type: FilterType,
    pub filter_frequency: f32,
    pub reverb_decay: f32,
    pub reverb_wet: f32,
    pub attack: f32,
    pub release: f32,
    pub harmonicity: f32,
}

impl Default for TimbreConfig {
    fn default() -> Self {
        Self {
            oscillator_enabled: true,
            oscillator_type: OscillatorType::Sine,
            filter_type: FilterType::LowPass,
            filter_frequency: 1000.0,
            reverb_decay: 5.0,
            reverb_wet: 0.5,
            attack: 0.5,
            release: 2.0,
            harmonicity: 1.5,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumConfig {
    pub pattern: PatternKind,
    pub tempo: f32,
    pub volume: f32,
    pub filter: f32,
}

impl Default for DrumConfig {
    fn default() -> Self {
        Self {
            pattern: PatternKind::None,
            tempo: DEFAULT_TEMPO,
            volume: 0.5,
            filter: 1000.0,
        }
    }
}

/// Partial update over both configs. Unset fields are left alone.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfigPatch {
    pub oscillator_enabled: Option<bool>,
    pub oscillator_type: Option<OscillatorType>,
    pub filter_type: Option<FilterType>,
    pub filter_frequency: Option<f32>,
    pub reverb_decay: Option<f32>,
    pub reverb_wet: Option<f32>,
    pub attack: Option<f32>,
    pub release: Option<f32>,
    pub harmonicity: Option<f32>,

    pub drum_pattern: Option<PatternKind>,
    pub tempo: Option<f32>,
    pub drum_volume: Option<f32>,
    pub drum_filter: Option<f32>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that sets every timbre field (what a preset is).
    pub fn timbre(config: &TimbreConfig) -> Self {
        Self {
            oscillator_enabled: Some(config.oscillator_enabled),
            oscillator_type: Some(config.oscillator_type),
            filter_type: Some(config.filter_type),
            filter_frequency: Some(config.filter_frequency),
            reverb_decay: Some(config.reverb_decay),
            reverb_wet: Some(config.reverb_wet),
            attack: Some(config.attack),
            release: Some(config.release),
            harmonicity: Some(config.harmonicity),
            ..Self::default()
        }
    }

    pub fn oscillator_enabled(mut self, enabled: bool) -> Self {
        self.oscillator_enabled = Some(enabled);
        self
    }

    pub fn oscillator_type(mut self, kind: OscillatorType) -> Self {
        self.oscillator_type = Some(kind);
        self
    }

    pub fn filter_type(mut self, kind: FilterType) -> Self {
        self.filter_type = Some(kind);
        self
    }

    pub fn filter_frequency(mut self, hz: f32) -> Self {
        self.filter_frequency = Some(hz);
        self
    }

    pub fn reverb_decay(mut self, seconds: f32) -> Self {
        self.reverb_decay = Some(seconds);
        self
    }

    pub fn reverb_wet(mut self, wet: f32) -> Self {
        self.reverb_wet = Some(wet);
        self
    }

    pub fn attack(mut self, seconds: f32) -> Self {
        self.attack = Some(seconds);
        self
    }

    pub fn release(mut self, seconds: f32) -> Self {
        self.release = Some(seconds);
        self
    }

    pub fn harmonicity(mut self, ratio: f32) -> Self {
        self.harmonicity = Some(ratio);
        self
    }

    pub fn drum_pattern(mut self, kind: PatternKind) -> Self {
        self.drum_pattern = Some(kind);
        self
    }

    pub fn tempo(mut self, bpm: f32) -> Self {
        self.tempo = Some(bpm);
        self
    }

    pub fn drum_volume(mut self, volume: f32) -> Self {
        self.drum_volume = Some(volume);
        self
    }

    pub fn drum_filter(mut self, hz: f32) -> Self {
        self.drum_filter = Some(hz);
        self
    }
}

/// What a merge changed in the timbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimbreChange {
    pub changed: bool,
    /// The reverb has to be rebuilt.
    pub decay_changed: bool,
}

/// What a merge changed in the drums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrumChange {
    pub pattern_changed: bool,
    pub tempo_changed: bool,
    pub bus_changed: bool,
}

impl DrumChange {
    pub fn any(&self) -> bool {
        self.pattern_changed || self.tempo_changed || self.bus_changed
    }
}

impl TimbreConfig {
    pub fn merge(&mut self, patch: &ConfigPatch) -> TimbreChange {
        let before = *self;

        if let Some(enabled) = patch.oscillator_enabled {
            self.oscillator_enabled = enabled;
        }
        if let Some(kind) = patch.oscillator_type {
            self.oscillator_type = kind;
        }
        if let Some(kind) = patch.filter_type {
            self.filter_type = kind;
        }
        self.filter_frequency = merge(
            self.filter_frequency,
            patch.filter_frequency,
            FILTER_FREQUENCY_RANGE,
        );
        self.reverb_decay = merge(self.reverb_decay, patch.reverb_decay, REVERB_DECAY_RANGE);
        self.reverb_wet = merge(self.reverb_wet, patch.reverb_wet, UNIT_RANGE);
        self.attack = merge(self.attack, patch.attack, ATTACK_RANGE);
        self.release = merge(self.release, patch.release, RELEASE_RANGE);
        self.harmonicity = merge(self.harmonicity, patch.harmonicity, HARMONICITY_RANGE);

        TimbreChange {
            changed: *self != before,
            decay_changed: self.reverb_decay != before.reverb_decay,
        }
    }
}

impl DrumConfig {
    pub fn merge(&mut self, patch: &ConfigPatch) -> DrumChange {
        let before = *self;

        if let Some(kind) = patch.drum_pattern {
            self.pattern = kind;
        }
        self.tempo = merge(self.tempo, patch.tempo, TEMPO_RANGE);
        self.volume = merge(self.volume, patch.drum_volume, UNIT_RANGE);
        self.filter = merge(self.filter, patch.drum_filter, DRUM_FILTER_RANGE);

        DrumChange {
            pattern_changed: self.pattern != before.pattern,
            tempo_changed: self.tempo != before.tempo,
            bus_changed: self.volume != before.volume || self.filter != before.filter,
        }
    }
}
