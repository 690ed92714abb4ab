use crate::graph::node::{GraphNode, RenderCtx};

/*
Serial Signal Chain (Through)
=============================

    [Source] ──→ [Effect] ──→ output

The source renders into the output buffer, then the effect processes that
buffer in place. Note events reach both, so an effect that cares about notes
(an envelope used as a gate, say) still sees them.

  let hat = metal_bank
      .through(FilterNode::highpass(4000.0))
      .amplify(EnvNode::adsr(0.001, 0.1, 0.0, 0.01));
*/

pub struct Through<S, F> {
    pub source: S,
    pub effect: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, effect: F) -> Self {
        Self { source, effect }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.effect.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.effect.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source.note_off(ctx);
        self.effect.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active() || self.effect.is_active()
    }

    fn get_envelope_level(&self) -> Option<f32> {
        self.source.get_envelope_level()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{
        extensions::NodeExt, filter::FilterNode, node::GraphNode, node::RenderCtx,
        oscillator::OscNode,
    };

    #[test]
    fn effect_sees_source_output() {
        let ctx = RenderCtx::from_freq(48_000.0, 8_000.0, 1.0);
        let mut dry = OscNode::sine();
        let mut filtered = OscNode::sine().through(FilterNode::lowpass(200.0));

        let mut a = vec![0.0; 512];
        let mut b = vec![0.0; 512];
        dry.render_block(&mut a, &ctx);
        filtered.render_block(&mut b, &ctx);

        let energy = |buf: &[f32]| buf.iter().map(|s| s * s).sum::<f32>();
        assert!(energy(&b) < energy(&a) * 0.1);
    }
}
