//! Closed hi-hat voice.
//!
//! Six square partials at inharmonic ratios of 200 Hz (see `dsp::metal`),
//! high-passed at 4 kHz so only the metallic shimmer survives, with a very
//! short envelope and a fixed -20 dB trim so it sits under the kick and snare.

use crate::dsp::{gain::db_to_gain, metal::MetalBank};
use crate::graph::{
    envelope::EnvNode,
    extensions::NodeExt,
    filter::FilterNode,
    gain::GainNode,
    node::{GraphNode, RenderCtx},
};

pub const HIHAT_BASE_FREQUENCY: f32 = 200.0;
pub const HIHAT_HIGHPASS: f32 = 4_000.0;
pub const HIHAT_LEVEL_DB: f32 = -20.0;

/// Metallic bank as a graph node. Its pitch is fixed, the note frequency is
/// ignored.
pub struct MetalNode {
    bank: MetalBank,
}

impl MetalNode {
    pub fn new(base_frequency: f32) -> Self {
        Self {
            bank: MetalBank::new(base_frequency),
        }
    }
}

impl GraphNode for MetalNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.bank.render(out, ctx.sample_rate);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.bank.reset();
    }
}

pub fn hihat() -> impl GraphNode {
    MetalNode::new(HIHAT_BASE_FREQUENCY)
        .through(FilterNode::highpass(HIHAT_HIGHPASS))
        .amplify(EnvNode::adsr(0.001, 0.1, 0.0, 0.01))
        .through(GainNode::new(db_to_gain(HIHAT_LEVEL_DB)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hat_is_quiet_and_short() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut voice = hihat();
        voice.note_on(&ctx);

        let mut head = vec![0.0f32; 512];
        voice.render_block(&mut head, &ctx);
        let peak = head.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.0 && peak <= 0.3, "peak {peak}");

        let mut tail = vec![0.0f32; 2048];
        for _ in 0..4 {
            voice.render_block(&mut tail, &ctx);
        }
        assert!(tail.iter().all(|&s| s == 0.0));
    }
}
