use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
TPT State-Variable Filter
=========================

One structure, four responses, all read from the same integrator state:

| response | output              | passes          |
| -------- | ------------------- | --------------- |
| lowpass  | v2                  | below cutoff    |
| highpass | x - k·v1 - v2       | above cutoff    |
| bandpass | v1                  | around cutoff   |
| notch    | x - k·v1            | all but cutoff  |

Damping is `k = 1 / Q`. Q = 0.707 is maximally flat, Q = 1 is the engine's
default, and the voice chain reaches up to Q = 10 (a pronounced peak at the
cutoff). Because every response shares the integrators, switching the filter
type on a sounding signal does not reset state and does not click.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

pub const DEFAULT_Q: f32 = 1.0;
pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 10.0;

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,

    pub cutoff_hz: f32,
    pub q: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q: DEFAULT_Q,
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz)
    }

    pub fn notch(cutoff_hz: f32) -> Self {
        Self::new(FilterType::Notch, cutoff_hz)
    }

    #[inline]
    fn compute_g(&self, ctx: &RenderCtx) -> f32 {
        // Keep the prewarped cutoff below Nyquist; tan() explodes at π/2.
        let nyquist_guard = ctx.sample_rate * 0.49;
        let cutoff = self.cutoff_hz.min(nyquist_guard);
        (TAU * cutoff / (2.0 * ctx.sample_rate)).tan()
    }

    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let g = self.compute_g(ctx);
        let k = 1.0 / self.q;

        for sample in buffer.iter_mut() {
            let outputs = self.next_sample(*sample, k, g);

            *sample = match self.filter_type {
                FilterType::LowPass => outputs.lowpass,
                FilterType::HighPass => outputs.highpass,
                FilterType::BandPass => outputs.bandpass,
                FilterType::Notch => outputs.notch,
            }
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q.clamp(MIN_Q, MAX_Q);
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }
}
