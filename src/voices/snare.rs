//! Snare drum voice: a white-noise burst with a short envelope and no
//! sustain, so the hit dies away on its own even if note-off comes late.

use crate::graph::{envelope::EnvNode, extensions::NodeExt, node::GraphNode, oscillator::OscNode};

pub fn snare() -> impl GraphNode {
    OscNode::noise().amplify(EnvNode::adsr(0.001, 0.2, 0.0, 0.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;

    #[test]
    fn burst_dies_without_note_off() {
        let ctx = RenderCtx::from_freq(48_000.0, 200.0, 1.0);
        let mut voice = snare();
        voice.note_on(&ctx);

        let mut head = vec![0.0f32; 256];
        voice.render_block(&mut head, &ctx);
        assert!(head.iter().any(|s| s.abs() > 0.1));

        // past attack + decay the sustain level is zero
        let mut tail = vec![0.0f32; 2048];
        for _ in 0..6 {
            voice.render_block(&mut tail, &ctx);
        }
        assert!(tail.iter().all(|&s| s == 0.0));
    }
}
