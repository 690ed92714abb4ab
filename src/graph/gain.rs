use crate::dsp::gain::GainRamp;
use crate::graph::node::{GraphNode, RenderCtx};

/// Output stage: a linear gain with an independent mute override.
///
/// Both gain and mute changes ramp over a few milliseconds. Muting does not
/// forget the gain, so unmuting returns to exactly the previous level.
pub struct GainNode {
    ramp: GainRamp,
    gain: f32,
    muted: bool,
}

impl GainNode {
    pub fn new(gain: f32) -> Self {
        Self {
            ramp: GainRamp::new(gain),
            gain,
            muted: false,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
        self.retarget();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.retarget();
    }

    /// Gain actually being applied after mute, once any ramp has settled.
    pub fn effective_gain(&self) -> f32 {
        self.ramp.target()
    }

    /// Drop to silence immediately, skipping the ramp.
    pub fn silence(&mut self) {
        self.gain = 0.0;
        self.ramp.snap(0.0);
    }

    fn retarget(&mut self) {
        let target = if self.muted { 0.0 } else { self.gain };
        self.ramp.set_target(target);
    }
}

impl GraphNode for GainNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.ramp.process(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(node: &mut GainNode) -> Vec<f32> {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut buffer = vec![1.0f32; 1024];
        node.render_block(&mut buffer, &ctx);
        buffer
    }

    #[test]
    fn mute_overrides_gain_without_forgetting_it() {
        let mut node = GainNode::new(0.5);
        node.set_muted(true);
        assert_eq!(*settle(&mut node).last().unwrap(), 0.0);
        assert_eq!(node.gain(), 0.5);

        node.set_muted(false);
        assert_eq!(*settle(&mut node).last().unwrap(), 0.5);
    }

    #[test]
    fn gain_change_ramps() {
        let mut node = GainNode::new(0.0);
        node.set_gain(1.0);
        let out = settle(&mut node);

        assert!(out[0] < 0.1, "first sample should still be near old gain");
        assert_eq!(*out.last().unwrap(), 1.0);
    }

    #[test]
    fn silence_is_immediate() {
        let mut node = GainNode::new(1.0);
        node.silence();
        assert!(settle(&mut node).iter().all(|&s| s == 0.0));
    }
}
