//! Schroeder reverb with a decay time fixed at construction.
//!
//! ```text
//! Input ──┬──→ [Comb 1] ──┐
//!         ├──→ [Comb 2] ──┤
//!         ├──→ [Comb 3] ──┼──→ (+) ──→ [Allpass 1] ──→ [Allpass 2] ──→ Output
//!         └──→ [Comb 4] ──┘
//! ```
//!
//! Each comb's feedback is derived from the requested RT60 (time for the tail
//! to fall by 60 dB):
//!
//! ```text
//! g = 10^(-3 · delay / decay)
//! ```
//!
//! so every comb loses 60 dB over the same `decay` seconds regardless of its
//! own delay length. Delay lines are sized for the sample rate once, when the
//! reverb is built. There is deliberately no `set_decay`: a reverb with a
//! different decay is a different unit, and the signal chain swaps units
//! instead of mutating one (see `chain`).

use crate::error::GraphError;

/// Comb delay times in ms (mutually prime ratios)
const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
/// Allpass delay times in ms
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
const ALLPASS_FEEDBACK: f32 = 0.5;

pub struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
            damp: 0.2,
            filter_state: 0.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        // One-pole lowpass in the loop: highs die faster than lows
        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;

        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

pub struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: ALLPASS_FEEDBACK,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.9);
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -self.feedback * input + delayed;

        self.buffer[self.write_pos] = input + self.feedback * output;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

pub struct SchroederReverb {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
    decay: f32,
}

impl SchroederReverb {
    /// Build a reverb whose tail falls 60 dB over `decay` seconds.
    pub fn with_decay(sample_rate: f32, decay: f32) -> Result<Self, GraphError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(GraphError::InvalidSampleRate(sample_rate));
        }
        if !decay.is_finite() || decay <= 0.0 {
            return Err(GraphError::InvalidDecay(decay));
        }

        let samples = |ms: f32| (ms * sample_rate / 1000.0) as usize;

        let mut combs = COMB_DELAYS_MS.map(|ms| CombFilter::new(samples(ms)));
        for (comb, ms) in combs.iter_mut().zip(COMB_DELAYS_MS) {
            comb.set_feedback(comb_feedback(ms / 1000.0, decay));
        }
        let allpasses = ALLPASS_DELAYS_MS.map(|ms| AllpassFilter::new(samples(ms)));

        Ok(Self {
            combs,
            allpasses,
            decay,
        })
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// High frequency absorption, 0.0 (bright) to 1.0 (dark).
    pub fn set_damping(&mut self, damp: f32) {
        for comb in &mut self.combs {
            comb.set_damp(damp);
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        output *= 0.25;

        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }

        output
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

/// Loop gain that gives a 60 dB loss after `decay` seconds for a loop of
/// `delay` seconds.
#[inline]
pub fn comb_feedback(delay: f32, decay: f32) -> f32 {
    10.0_f32.powf(-3.0 * delay / decay)
}
