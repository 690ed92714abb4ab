use crate::graph::node::{GraphNode, RenderCtx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Released, envelope in release phase
}

/// A single voice that can play any GraphNode at a given frequency.
pub struct Voice<T: GraphNode> {
    frequency: f32,
    velocity: f32,
    state: VoiceState,
    age: u64,
    sample_rate: f32,
    graph: T,
}

impl<T: GraphNode> Voice<T> {
    pub fn new(graph: T, sample_rate: f32) -> Self {
        Self {
            frequency: 0.0,
            velocity: 0.0,
            state: VoiceState::Free,
            age: 0,
            sample_rate,
            graph,
        }
    }

    fn ctx(&self) -> RenderCtx {
        RenderCtx::from_freq(self.sample_rate, self.frequency, self.velocity)
    }

    pub fn start(&mut self, frequency: f32, velocity: f32, age: u64) {
        self.frequency = frequency;
        self.velocity = velocity;
        self.state = VoiceState::Active;
        self.age = age;

        let ctx = self.ctx();
        self.graph.note_on(&ctx);
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;

            let ctx = self.ctx();
            self.graph.note_off(&ctx);
        }
    }

    pub fn render(&mut self, out: &mut [f32]) {
        let ctx = self.ctx();
        self.graph.render_block(out, &ctx);

        // Released and the envelope has finished: hand the voice back
        if self.state == VoiceState::Releasing && !self.graph.is_active() {
            self.free();
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn get_envelope_level(&self) -> Option<f32> {
        self.graph.get_envelope_level()
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.frequency = 0.0;
        self.velocity = 0.0;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn graph_mut(&mut self) -> &mut T {
        &mut self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorWaveform;
    use crate::voices::tone;

    #[test]
    fn voice_frees_itself_after_release_tail() {
        let mut voice = Voice::new(tone(OscillatorWaveform::Sine, 0.001, 0.01), 48_000.0);
        voice.start(220.0, 1.0, 0);
        assert_eq!(voice.state(), VoiceState::Active);

        let mut buffer = vec![0.0f32; 512];
        voice.render(&mut buffer);
        voice.release();
        assert_eq!(voice.state(), VoiceState::Releasing);

        voice.render(&mut buffer);
        assert!(voice.is_free());
    }

    #[test]
    fn release_is_ignored_when_free() {
        let mut voice = Voice::new(tone(OscillatorWaveform::Sine, 0.001, 0.01), 48_000.0);
        voice.release();
        assert!(voice.is_free());
    }
}
