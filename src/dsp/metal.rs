//! Inharmonic square-wave bank for metallic percussion.
//!
//! Six square oscillators tuned to non-integer ratios of a base pitch. None of
//! the partials line up as harmonics, so the sum has no clear pitch and, once
//! high-passed, reads as cymbal/hat shimmer. The ratios are the ones classic
//! analog drum machines used for their hats and cymbals.

use super::oscillator::OscillatorBlock;

pub const METAL_RATIOS: [f32; 6] = [1.0, 1.4471, 1.6170, 1.9265, 2.5028, 2.6637];

pub struct MetalBank {
    partials: [OscillatorBlock; 6],
    base_frequency: f32,
}

impl MetalBank {
    pub fn new(base_frequency: f32) -> Self {
        Self {
            partials: std::array::from_fn(|_| OscillatorBlock::square()),
            base_frequency,
        }
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Restart every partial at phase zero so each hit has the same attack.
    pub fn reset(&mut self) {
        for partial in &mut self.partials {
            partial.reset();
        }
    }

    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        let scale = 1.0 / self.partials.len() as f32;
        for sample in out.iter_mut() {
            let mut sum = 0.0;
            for (partial, ratio) in self.partials.iter_mut().zip(METAL_RATIOS) {
                sum += partial.next_sample(self.base_frequency * ratio, sample_rate);
            }
            *sample = sum * scale;
        }
    }
}
