use crate::config::TimbreConfig;
use crate::dsp::gain::db_to_gain;
use crate::dsp::modulate::block_average;
use crate::dsp::oscillator::OscillatorWaveform;
use crate::synth::{poly::PolySynth, voice::Voice};
use crate::voices::tone::{self, ToneVoice};
use crate::MAX_BLOCK_SIZE;

/// Voices in the chord pool.
pub const POLYPHONY: usize = 8;
/// Per-voice level so a full three-note chord stays within [-1, 1].
pub const VOICE_GAIN: f32 = 1.0 / 3.0;
pub const MODULATOR_LEVEL_DB: f32 = -20.0;

const NOTE_VELOCITY: f32 = 1.0;

pub type ToneSynth = PolySynth<fn() -> ToneVoice>;

fn default_tone() -> ToneVoice {
    let config = TimbreConfig::default();
    tone::tone(
        config.oscillator_type.waveform(),
        config.attack,
        config.release,
    )
}

/// Chord voices plus the filter modulator.
///
/// The chord goes out through `render`'s buffer. The modulator never does:
/// its block average is returned so the chain can move the filter cutoff.
pub struct VoiceBank {
    synth: ToneSynth,
    modulator: Voice<ToneVoice>,
    modulator_buffer: Vec<f32>,
    modulator_gain: f32,
    next_age: u64,
}

impl VoiceBank {
    pub fn new(sample_rate: f32, config: &TimbreConfig) -> Self {
        let mut bank = Self {
            synth: PolySynth::new(default_tone as fn() -> ToneVoice, sample_rate, POLYPHONY),
            modulator: Voice::new(tone::modulator(), sample_rate),
            modulator_buffer: vec![0.0; MAX_BLOCK_SIZE],
            modulator_gain: db_to_gain(MODULATOR_LEVEL_DB),
            next_age: 0,
        };
        bank.configure(config);
        bank
    }

    /// Start one voice per chord note.
    pub fn trigger(&mut self, chord: [f32; 3]) {
        for frequency in chord {
            if !(frequency.is_finite() && frequency > 0.0) {
                log::debug!("skipping chord note at {frequency} Hz");
                continue;
            }
            self.synth.note_on(frequency, NOTE_VELOCITY);
        }
    }

    /// (Re)start the cutoff modulator at `frequency` Hz.
    pub fn trigger_modulator(&mut self, frequency: f32) {
        let frequency = if frequency.is_finite() {
            frequency.max(0.0)
        } else {
            0.0
        };
        self.next_age += 1;
        self.modulator.start(frequency, NOTE_VELOCITY, self.next_age);
    }

    /// Move every sounding voice and the modulator into release.
    pub fn release(&mut self) {
        self.synth.release_all();
        self.modulator.release();
    }

    /// Retune waveform and envelope times on every voice, sounding or not.
    pub fn configure(&mut self, config: &TimbreConfig) {
        let waveform: OscillatorWaveform = config.oscillator_type.waveform();
        for voice in self.synth.voices_mut() {
            tone::configure(voice.graph_mut(), waveform, config.attack, config.release);
        }
    }

    /// Render the chord into `out` and return the modulator's block average.
    pub fn render(&mut self, out: &mut [f32]) -> f32 {
        self.synth.render_block(out);
        for sample in out.iter_mut() {
            *sample *= VOICE_GAIN;
        }

        if !self.modulator.is_active() {
            return 0.0;
        }
        let control = &mut self.modulator_buffer[..out.len()];
        control.fill(0.0);
        self.modulator.render(control);
        block_average(control) * self.modulator_gain
    }

    /// Silence everything at once (teardown only).
    pub fn free_all(&mut self) {
        self.synth.free_all();
        self.modulator.free();
    }

    pub fn active_voices(&self) -> usize {
        self.synth.active_voices()
    }

    pub fn modulator_active(&self) -> bool {
        self.modulator.is_active()
    }

    pub fn synth_mut(&mut self) -> &mut ToneSynth {
        &mut self.synth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OscillatorType, SoundParameters};

    const SR: f32 = 48_000.0;

    #[test]
    fn chord_takes_three_voices() {
        let mut bank = VoiceBank::new(SR, &TimbreConfig::default());
        let params = SoundParameters::new(220.0, 5.0, 0.5);
        bank.trigger(params.chord(1.5));
        assert_eq!(bank.active_voices(), 3);
    }

    #[test]
    fn zero_hz_notes_are_skipped() {
        let mut bank = VoiceBank::new(SR, &TimbreConfig::default());
        bank.trigger([220.0, 0.0, 330.0]);
        assert_eq!(bank.active_voices(), 2);
    }

    #[test]
    fn configure_reaches_sounding_voices() {
        let mut bank = VoiceBank::new(SR, &TimbreConfig::default());
        bank.trigger([220.0, 330.0, 330.0]);

        bank.configure(&TimbreConfig {
            oscillator_type: OscillatorType::Sawtooth,
            ..TimbreConfig::default()
        });

        for voice in bank.synth_mut().voices_mut() {
            assert_eq!(voice.graph_mut().signal.waveform(), OscillatorWaveform::Saw);
        }
    }

    #[test]
    fn release_lets_envelopes_finish() {
        let config = TimbreConfig {
            attack: 0.001,
            release: 0.05,
            ..TimbreConfig::default()
        };
        let mut bank = VoiceBank::new(SR, &config);
        bank.trigger([220.0, 275.0, 330.0]);
        bank.trigger_modulator(5.0);

        let mut block = vec![0.0; 512];
        bank.render(&mut block);
        bank.release();

        bank.render(&mut block);
        assert_eq!(bank.active_voices(), 3, "voices should still be releasing");
        assert!(block.iter().any(|s| s.abs() > 0.01));

        for _ in 0..20 {
            bank.render(&mut block);
        }
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn modulator_only_feeds_the_control_value() {
        let mut bank = VoiceBank::new(SR, &TimbreConfig::default());
        bank.trigger_modulator(5.0);

        let mut block = vec![0.0; 512];
        let control = bank.render(&mut block);

        assert!(block.iter().all(|&s| s == 0.0));
        assert!(control > 0.0);
        assert!(bank.modulator_active());
    }
}
