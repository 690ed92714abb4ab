use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Oscillator Node
===============

The sound source of every tone voice. Waveform character, roughly from soft to
bright:

  sine      fundamental only; the default ambient pad
  triangle  odd harmonics falling off as 1/n², soft and flute-like
  square    odd harmonics falling off as 1/n, hollow
  sawtooth  every harmonic, 1/n; bright and buzzy, pairs well with bandpass
  noise     no pitch at all; used for the snare burst

The node always plays `ctx.frequency`, so one voice graph can render any note
of a chord; the voice decides the pitch when it renders.

The waveform can be switched while a note sounds (`set_waveform`); phase is
kept, so the switch is a timbre change rather than a restart.

  let voice = OscNode::sawtooth()
      .through(FilterNode::lowpass(2000.0))
      .amplify(EnvNode::adsr(0.01, 0.1, 0.7, 0.3));
*/

pub struct OscNode {
    osc: OscillatorBlock,
}

impl OscNode {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn noise() -> Self {
        Self::new(OscillatorWaveform::Noise)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.osc.waveform()
    }

    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.osc.set_waveform(waveform);
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.osc.render(out, ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.osc.reset();
    }
}
