use crate::dsp::reverb::SchroederReverb;
use crate::error::GraphError;
use crate::graph::node::{GraphNode, RenderCtx};

/*
Reverb Node
===========

Wet/dry wrapper around the Schroeder reverb:

    out = dry × (1 - wet) + reverb(dry) × wet

Wet is a live parameter. Decay is not: the node is built for one decay time
and sample rate and keeps them for life. Asking for a different decay means
building a new node (`ReverbNode::new`) and swapping it in; `SignalChain`
does this and crossfades the two while the swap settles.

  wet 0.0   dry only
  wet 0.3   subtle room
  wet 0.5   the ambient default, tail as loud as the source
  wet 1.0   tail only
*/

const DEFAULT_DAMPING: f32 = 0.2;

pub struct ReverbNode {
    reverb: SchroederReverb,
    wet: f32,
}

impl ReverbNode {
    pub fn new(decay: f32, wet: f32, sample_rate: f32) -> Result<Self, GraphError> {
        let mut reverb = SchroederReverb::with_decay(sample_rate, decay)?;
        reverb.set_damping(DEFAULT_DAMPING);

        Ok(Self {
            reverb,
            wet: wet.clamp(0.0, 1.0),
        })
    }

    pub fn decay(&self) -> f32 {
        self.reverb.decay()
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn reset(&mut self) {
        self.reverb.reset();
    }
}

impl GraphNode for ReverbNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        let dry_gain = 1.0 - self.wet;
        for sample in out.iter_mut() {
            let dry = *sample;
            let wet = self.reverb.process(dry);
            *sample = dry * dry_gain + wet * self.wet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(48_000.0, 440.0, 1.0)
    }

    #[test]
    fn adds_tail() {
        let mut reverb = ReverbNode::new(2.0, 1.0, 48_000.0).unwrap();

        let mut impulse = vec![1.0; 1];
        reverb.render_block(&mut impulse, &ctx());

        let mut tail_energy = 0.0;
        for _ in 0..100 {
            let mut buf = vec![0.0; 64];
            reverb.render_block(&mut buf, &ctx());
            tail_energy += buf.iter().map(|x| x * x).sum::<f32>();
        }

        assert!(tail_energy > 0.01, "reverb should produce a tail");
    }

    #[test]
    fn dry_preserves_signal() {
        let mut reverb = ReverbNode::new(2.0, 0.0, 48_000.0).unwrap();

        let mut buffer = vec![0.5, 0.3, 0.7];
        let original = buffer.clone();
        reverb.render_block(&mut buffer, &ctx());

        assert_eq!(buffer, original);
    }

    #[test]
    fn wet_is_live_decay_is_fixed() {
        let mut reverb = ReverbNode::new(5.0, 0.5, 48_000.0).unwrap();
        reverb.set_wet(0.8);

        assert_eq!(reverb.wet(), 0.8);
        assert_eq!(reverb.decay(), 5.0);
    }

    #[test]
    fn construction_errors_surface() {
        assert!(ReverbNode::new(f32::NAN, 0.5, 48_000.0).is_err());
        assert!(ReverbNode::new(1.0, 0.5, -1.0).is_err());
    }
}
