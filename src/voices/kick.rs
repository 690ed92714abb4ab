//! Kick drum voice.
//!
//! Membrane synthesis: a sine whose pitch starts several octaves above the
//! tuned note and glides exponentially down to it, gated by a fast-attack,
//! long-release envelope.
//!
//! ```text
//! freq(t) = pitch · 2^(octaves · (1 - t / pitch_decay))    t < pitch_decay
//!         = pitch                                          afterwards
//! ```
//!
//! With five octaves over 50 ms the first few milliseconds sweep through the
//! audible "click" range and the body settles at the fundamental. The kit
//! always triggers it at C1.

use std::f32::consts::TAU;

use crate::graph::{
    envelope::EnvNode,
    extensions::NodeExt,
    node::{GraphNode, RenderCtx},
};

/// C1
pub const KICK_PITCH: f32 = 32.70;
pub const KICK_OCTAVES: f32 = 5.0;
pub const KICK_PITCH_DECAY: f32 = 0.05;

/// Sine with an exponential downward pitch sweep restarted on every note.
pub struct MembraneNode {
    octaves: f32,
    pitch_decay: f32,
    phase: f32,
    elapsed: f32,
}

impl MembraneNode {
    pub fn new(octaves: f32, pitch_decay: f32) -> Self {
        Self {
            octaves,
            pitch_decay: pitch_decay.max(crate::MIN_TIME),
            phase: 0.0,
            elapsed: 0.0,
        }
    }

    #[inline]
    fn frequency_at(&self, pitch: f32) -> f32 {
        if self.elapsed >= self.pitch_decay {
            return pitch;
        }
        let remaining = 1.0 - self.elapsed / self.pitch_decay;
        pitch * (self.octaves * remaining).exp2()
    }
}

impl GraphNode for MembraneNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let dt = 1.0 / ctx.sample_rate;
        for sample in out.iter_mut() {
            *sample = (TAU * self.phase).sin();

            self.phase += self.frequency_at(ctx.frequency) * dt;
            self.phase -= self.phase.floor();
            self.elapsed += dt;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.phase = 0.0;
        self.elapsed = 0.0;
    }
}

pub fn kick() -> impl GraphNode {
    MembraneNode::new(KICK_OCTAVES, KICK_PITCH_DECAY).amplify(EnvNode::adsr(0.001, 0.4, 0.01, 1.4))
}
