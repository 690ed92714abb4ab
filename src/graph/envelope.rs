use crate::{
    dsp::envelope::{Envelope, EnvelopeState},
    graph::node::{GraphNode, RenderCtx},
};

/// ADSR envelope as a graph node. Its output is a gain curve in [0, 1],
/// usually fed to `.amplify()`.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            env: Envelope::adsr(attack, decay, sustain, release),
        }
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.env.set_attack(seconds);
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.env.set_decay(seconds);
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.env.set_sustain(level);
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.env.set_release(seconds);
    }

    pub fn state(&self) -> EnvelopeState {
        self.env.state()
    }

    pub fn reset(&mut self) {
        self.env.reset();
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}
