use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Linear ADSR Envelope
====================

    Level
      1.0 ┐     ╱╲
          │    ╱  ╲___________
      S   │   ╱               ╲
          │  ╱                 ╲
      0.0 └─╱───────────────────╲──→ Time
           A    D     S          R

Stage transitions:

    Idle ──note_on──→ Attack ──level=1──→ Decay ──level=S──→ Sustain
      ↑                  │                  │                  │
      └────level=0─── Release ←──note_off───┴──────────────────┘

Release always starts from the *current* level, so releasing in the middle
of a long attack ramps down from wherever the note got to instead of jumping.
This is what lets the voice bank stop a chord "gracefully": note_off never
cuts the signal, it only schedules a ramp.

Stage times are read every sample, so `set_attack` / `set_release` take effect
on notes that are already sounding (the ambient pads are long enough that a
slider move during a note should be audible). Release length is snapshotted at
note_off so a release in progress always lands exactly on zero.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    decay_start_level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::adsr(0.01, 0.1, 0.7, 0.3)
    }
}

impl Envelope {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),

            stage: EnvelopeState::Idle,
            level: 0.0,
            decay_start_level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.attack_time = seconds.max(MIN_TIME);
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.decay_time = seconds.max(MIN_TIME);
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.sustain_level = level.clamp(0.0, 1.0);
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.release_time = seconds.max(MIN_TIME);
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    /// Gate high. Restarts the attack from zero so repeated hits stay distinct.
    pub fn note_on(&mut self, _ctx: &RenderCtx) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low. Starts the release ramp from the current level.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * ctx.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    pub fn next_sample(&mut self, ctx: &RenderCtx) {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                self.level += 1.0 / (self.attack_time * ctx.sample_rate);

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.decay_start_level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                let total_drop = self.decay_start_level - target;
                self.level -= total_drop / (self.decay_time * ctx.sample_rate);

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            self.next_sample(ctx);
            *sample = self.level;
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle)
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.decay_start_level = 0.0;
        self.release_elapsed_samples = 0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0)
    }

    fn render_samples(env: &mut Envelope, samples: usize) {
        let ctx = ctx();
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);

        env.note_on(&ctx());
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_ne!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, release);

        env.note_on(&ctx());
        render_samples(&mut env, 20);

        env.note_off(&ctx());
        render_samples(&mut env, (release * SAMPLE_RATE) as usize + 2);

        assert!(env.level() <= 0.001, "release should fall back to zero");
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn release_during_attack_starts_from_current_level() {
        let mut env = Envelope::adsr(0.1, 0.05, 1.0, 0.05);

        env.note_on(&ctx());
        render_samples(&mut env, 50); // halfway up the attack
        let before = env.level();

        env.note_off(&ctx());
        render_samples(&mut env, 1);

        assert!((env.level() - before).abs() < 0.05, "release must not jump");
        assert_eq!(env.state(), EnvelopeState::Release);
    }

    #[test]
    fn release_time_change_applies_to_next_note_off() {
        let mut env = Envelope::adsr(0.001, 0.01, 1.0, 0.01);
        env.set_release(0.5);

        env.note_on(&ctx());
        render_samples(&mut env, 20);
        env.note_off(&ctx());
        render_samples(&mut env, 100);

        assert!(env.is_active(), "longer release should still be ringing");
    }
}
