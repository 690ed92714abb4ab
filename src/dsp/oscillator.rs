use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
Phase-Accumulator Oscillator
============================

Every periodic waveform here is a function of a normalized phase in [0, 1):

    sine      sin(2π·phase)
    sawtooth  2·phase - 1
    square    +1 for phase < 0.5, -1 otherwise
    triangle  1 - 4·|phase - 0.5|   (starts at -1, peaks at phase 0.5)

Each sample we emit the waveform at the current phase and then advance:

    phase += frequency / sample_rate   (wrapped back into [0, 1))

Noise ignores phase and draws from a xorshift generator. It is cheap,
allocation-free and deterministic for a given seed, which keeps renders
reproducible in tests.

No band-limiting is applied. Square and sawtooth alias above a few kHz, which
is acceptable for the ambient register this engine plays in (chords rooted
around 200-700 Hz, drums filtered by the bus lowpass).
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Saw,
    Square,
    Triangle,
    Noise,
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
    rng_state: u32,
}

const NOISE_SEED: u32 = 0x9E37_79B9;

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            rng_state: NOISE_SEED,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn noise() -> Self {
        Self::new(OscillatorWaveform::Noise)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Switch waveform without resetting phase, so a sounding note keeps its
    /// position in the cycle.
    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        // xorshift32
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let value = match self.waveform {
            OscillatorWaveform::Sine => (TAU * self.phase).sin(),
            OscillatorWaveform::Saw => 2.0 * self.phase - 1.0,
            OscillatorWaveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
            OscillatorWaveform::Noise => return self.next_noise(),
        };

        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();

        value
    }

    pub fn render(&mut self, destination: &mut [f32], ctx: &RenderCtx) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample(ctx.frequency, ctx.sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_alternates_sign_each_half_cycle() {
        // 1 kHz at 8 kHz: 4 samples high, 4 samples low
        let mut osc = OscillatorBlock::square();
        let ctx = RenderCtx::from_freq(8_000.0, 1_000.0, 1.0);
        let mut buffer = [0.0f32; 8];
        osc.render(&mut buffer, &ctx);

        assert_eq!(&buffer[..4], &[1.0; 4]);
        assert_eq!(&buffer[4..], &[-1.0; 4]);
    }

    #[test]
    fn triangle_stays_in_range() {
        let mut osc = OscillatorBlock::triangle();
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut buffer = vec![0.0f32; 1024];
        osc.render(&mut buffer, &ctx);

        assert!(buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(buffer.iter().any(|s| *s > 0.9));
        assert!(buffer.iter().any(|s| *s < -0.9));
    }

    #[test]
    fn noise_is_bipolar_and_bounded() {
        let mut osc = OscillatorBlock::noise();
        let ctx = RenderCtx::from_freq(48_000.0, 0.0, 1.0);
        let mut buffer = vec![0.0f32; 4096];
        osc.render(&mut buffer, &ctx);

        let mean = buffer.iter().sum::<f32>() / buffer.len() as f32;
        assert!(buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(mean.abs() < 0.1, "noise should be roughly zero-mean, got {mean}");
    }

    #[test]
    fn set_waveform_keeps_phase() {
        let mut osc = OscillatorBlock::sawtooth();
        let ctx = RenderCtx::from_freq(8_000.0, 1_000.0, 1.0);
        let mut buffer = [0.0f32; 2];
        osc.render(&mut buffer, &ctx);

        // phase is now 0.25; square is high there
        osc.set_waveform(OscillatorWaveform::Square);
        let mut next = [0.0f32; 1];
        osc.render(&mut next, &ctx);
        assert_eq!(next[0], 1.0);
        assert_eq!(osc.waveform(), OscillatorWaveform::Square);
    }
}
