//! Tone voice for the voice bank.
//!
//! One oscillator gated by an ADSR envelope. The bank plays three of these per
//! chord; the pitch comes from the voice's `RenderCtx`, so every voice in the
//! pool is the same graph.
//!
//! Decay is short and sustain full, so after the attack the note simply holds
//! until released. Attack and release come from the timbre config and may be
//! changed while the note sounds.

use crate::dsp::oscillator::OscillatorWaveform;
use crate::graph::{amplify::Amplify, envelope::EnvNode, extensions::NodeExt, oscillator::OscNode};

pub const TONE_DECAY: f32 = 0.1;
pub const TONE_SUSTAIN: f32 = 1.0;

pub const MODULATOR_ATTACK: f32 = 0.5;
pub const MODULATOR_DECAY: f32 = 0.1;
pub const MODULATOR_SUSTAIN: f32 = 1.0;
pub const MODULATOR_RELEASE: f32 = 1.0;

pub type ToneVoice = Amplify<OscNode, EnvNode>;

pub fn tone(waveform: OscillatorWaveform, attack: f32, release: f32) -> ToneVoice {
    OscNode::new(waveform).amplify(EnvNode::adsr(attack, TONE_DECAY, TONE_SUSTAIN, release))
}

/// Retune a voice in place. Safe on a sounding voice.
pub fn configure(voice: &mut ToneVoice, waveform: OscillatorWaveform, attack: f32, release: f32) {
    voice.signal.set_waveform(waveform);
    voice.modulator.set_attack(attack);
    voice.modulator.set_release(release);
}

/// Slow sine whose output only steers the chain's filter cutoff.
pub fn modulator() -> ToneVoice {
    OscNode::sine().amplify(EnvNode::adsr(
        MODULATOR_ATTACK,
        MODULATOR_DECAY,
        MODULATOR_SUSTAIN,
        MODULATOR_RELEASE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{GraphNode, RenderCtx};

    #[test]
    fn configure_reaches_sounding_voice() {
        let ctx = RenderCtx::from_freq(48_000.0, 220.0, 1.0);
        let mut voice = tone(OscillatorWaveform::Sine, 0.01, 1.0);
        voice.note_on(&ctx);

        configure(&mut voice, OscillatorWaveform::Square, 0.01, 0.001);
        let mut buffer = vec![0.0f32; 2048];
        voice.render_block(&mut buffer, &ctx);

        assert_eq!(voice.signal.waveform(), OscillatorWaveform::Square);

        voice.note_off(&ctx);
        voice.render_block(&mut buffer, &ctx);
        assert!(!voice.is_active(), "shortened release should have finished");
    }
}
