//! Named timbre bundles. The engine only ever sees the patch.

use ambient_dsp::{ConfigPatch, FilterType, OscillatorType, TimbreConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    Ambient,
    Bright,
    Dark,
    Sharp,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Ambient, Preset::Bright, Preset::Dark, Preset::Sharp];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Ambient => "ambient",
            Preset::Bright => "bright",
            Preset::Dark => "dark",
            Preset::Sharp => "sharp",
        }
    }

    pub fn timbre(self) -> TimbreConfig {
        let (oscillator_type, filter_type, filter_frequency) = match self {
            Preset::Ambient => (OscillatorType::Sine, FilterType::LowPass, 1000.0),
            Preset::Bright => (OscillatorType::Triangle, FilterType::HighPass, 2000.0),
            Preset::Dark => (OscillatorType::Sine, FilterType::LowPass, 500.0),
            Preset::Sharp => (OscillatorType::Sawtooth, FilterType::BandPass, 1500.0),
        };
        // (decay, wet, attack, release, harmonicity)
        let (reverb_decay, reverb_wet, attack, release, harmonicity) = match self {
            Preset::Ambient => (5.0, 0.5, 0.5, 2.0, 1.5),
            Preset::Bright => (2.0, 0.3, 0.1, 1.0, 2.0),
            Preset::Dark => (8.0, 0.7, 1.0, 3.0, 1.2),
            Preset::Sharp => (1.0, 0.2, 0.05, 0.5, 3.0),
        };

        TimbreConfig {
            oscillator_enabled: true,
            oscillator_type,
            filter_type,
            filter_frequency,
            reverb_decay,
            reverb_wet,
            attack,
            release,
            harmonicity,
        }
    }

    pub fn patch(self) -> ConfigPatch {
        ConfigPatch::timbre(&self.timbre())
    }
}
