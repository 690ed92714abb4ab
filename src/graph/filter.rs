use crate::{
    dsp::filter::{FilterType, SVFilter},
    graph::node::{GraphNode, Modulatable, RenderCtx},
};

/*
Filter Node
===========

Wraps the state-variable filter for use in a graph. The node keeps a *base*
cutoff (what the user set) separately from the cutoff the filter is currently
running at, so block-rate modulation can move the effective cutoff around the
base without ever overwriting it:

    base 1000 Hz, modulator avg +0.2, depth 500 Hz  →  runs at 1100 Hz
    next block, modulator avg 0.0                    →  back at 1000 Hz

The effective cutoff is clamped to the audible band [20, 20000] Hz.

Resonance is expressed as Q (see dsp::filter): 1.0 is the default, the chain
maps its resonance control onto Q = clamp(resonance + 5, 0.1, 10).

  // Kit bus: one lowpass shared by every drum voice
  let bus = FilterNode::lowpass(1000.0);

  // Hi-hat: strip everything below the shimmer
  let hat = metal.through(FilterNode::highpass(4000.0));
*/

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;

#[derive(Clone, Copy, Debug)]
pub enum FilterParam {
    Cutoff,
}

pub struct FilterNode {
    filter: SVFilter,
    base_cutoff: f32,
}

impl FilterNode {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        let cutoff_hz = cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
        Self {
            filter: SVFilter::new(filter_type, cutoff_hz),
            base_cutoff: cutoff_hz,
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

    pub fn filter_type(&self) -> FilterType {
        self.filter.filter_type()
    }

    pub fn set_type(&mut self, filter_type: FilterType) {
        self.filter.set_filter_type(filter_type);
    }

    /// Set the base cutoff; the effective cutoff follows immediately.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.base_cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
        self.filter.set_cutoff(self.base_cutoff);
    }

    pub fn cutoff(&self) -> f32 {
        self.base_cutoff
    }

    /// Cutoff the filter is running at, after modulation.
    pub fn effective_cutoff(&self) -> f32 {
        self.filter.cutoff_hz
    }

    pub fn set_q(&mut self, q: f32) {
        self.filter.set_q(q);
    }

    pub fn q(&self) -> f32 {
        self.filter.q
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }
}

impl Modulatable for FilterNode {
    type Param = FilterParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            FilterParam::Cutoff => self.base_cutoff,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        match param {
            FilterParam::Cutoff => {
                let cutoff = (base + modulation).clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
                self.filter.set_cutoff(cutoff);
            }
        }
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx);
    }
}
