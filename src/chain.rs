//! The tone's signal chain: filter → reverb → output gain → waveform tap.

/*
Signal Chain
============

    voice bank ─→ filter ─→ [reverb slot] ─→ output gain ─→ waveform tap ─→ out
                    ↑
        modulator block average × 2000 Hz

The topology never changes. What can change is the unit sitting in the reverb
slot, because a reverb's decay is fixed when it is built. A new decay means a
new unit:

    slot: Wired(old)
      1. take the old unit out   → slot: Bypassed, old is now "retiring"
      2. wire the new unit       → slot: Wired(new)
      3. crossfade retiring → new over ~50 ms, then drop the retiring unit

The slot only ever holds one unit, so there is never a moment where the filter
feeds two reverbs into the output at full level, and the crossfade keeps the
tail from cutting out. If the new unit could not be built the slot stays
Bypassed and the filter feeds the output directly: dry, but never silent.

Wet and filter settings are plain parameters and change in place.

Volume
------

The level control is a slider in [0, 1]:

    0         → gain 0 (true silence)
    otherwise → 40·log10(level) dB, clamped to [-60, 0], to linear

Mute is a separate flag on the output gain, so unmuting lands back on the
last volume. Every gain change ramps over a few milliseconds.
*/

use crate::analysis::{analysis_window, AnalysisReader, AnalysisWriter, WAVEFORM_WINDOW};
use crate::config::{resonance_to_q, TimbreConfig};
use crate::dsp::gain::{db_to_gain, volume_level_to_gain};
use crate::error::GraphError;
use crate::graph::{
    filter::{FilterNode, FilterParam},
    gain::GainNode,
    reverb::ReverbNode,
    GraphNode, Modulatable, RenderCtx,
};
use crate::MAX_BLOCK_SIZE;

/// Cutoff swing for a full-scale modulator block average.
pub const MODULATION_DEPTH_HZ: f32 = 2000.0;
/// Output level before the first `set_volume`.
pub const INITIAL_VOLUME_DB: f32 = -10.0;
const CROSSFADE_SECONDS: f32 = 0.05;

enum ReverbSlot {
    Wired(Box<ReverbNode>),
    Bypassed,
}

struct Retiring {
    node: Box<ReverbNode>,
    remaining: usize,
    total: usize,
}

pub struct SignalChain {
    filter: FilterNode,
    reverb: ReverbSlot,
    retiring: Option<Retiring>,
    requested_decay: f32,
    wet: f32,
    output: GainNode,
    volume: Option<f32>,
    waveform_tap: AnalysisWriter,
    sample_rate: f32,
    dry: Vec<f32>,
    retire_buffer: Vec<f32>,
    disposed: bool,
}

impl SignalChain {
    /// Build the chain for `config` and the reader side of its waveform tap.
    pub fn new(sample_rate: f32, config: &TimbreConfig) -> (Self, AnalysisReader) {
        let (waveform_tap, reader) = analysis_window(WAVEFORM_WINDOW);

        let mut chain = Self {
            filter: FilterNode::new(config.filter_type, config.filter_frequency),
            reverb: ReverbSlot::Bypassed,
            retiring: None,
            requested_decay: config.reverb_decay,
            wet: config.reverb_wet,
            output: GainNode::new(db_to_gain(INITIAL_VOLUME_DB)),
            volume: None,
            waveform_tap,
            sample_rate,
            dry: vec![0.0; MAX_BLOCK_SIZE],
            retire_buffer: vec![0.0; MAX_BLOCK_SIZE],
            disposed: false,
        };

        match ReverbNode::new(config.reverb_decay, config.reverb_wet, sample_rate) {
            Ok(node) => chain.reverb = ReverbSlot::Wired(Box::new(node)),
            Err(err) => log::warn!("reverb unavailable ({err}), running dry"),
        }
        (chain, reader)
    }

    /// Apply a timbre config. Filter and wet change in place; a different
    /// decay builds a new reverb and swaps it in.
    pub fn configure(&mut self, config: &TimbreConfig) {
        if self.disposed {
            return;
        }

        self.filter.set_type(config.filter_type);
        self.filter.set_cutoff(config.filter_frequency);

        self.wet = config.reverb_wet.clamp(0.0, 1.0);
        if let ReverbSlot::Wired(node) = &mut self.reverb {
            node.set_wet(self.wet);
        }

        if config.reverb_decay != self.requested_decay {
            let rebuilt = ReverbNode::new(config.reverb_decay, self.wet, self.sample_rate);
            self.install_reverb(config.reverb_decay, rebuilt.map(Box::new));
        }
    }

    /// Swap a reverb built elsewhere into the slot. An `Err` leaves the slot
    /// bypassed.
    pub fn install_reverb(&mut self, decay: f32, reverb: Result<Box<ReverbNode>, GraphError>) {
        if self.disposed {
            return;
        }
        self.requested_decay = decay;

        let old = std::mem::replace(&mut self.reverb, ReverbSlot::Bypassed);
        match reverb {
            Ok(mut node) => {
                node.set_wet(self.wet);
                log::debug!("reverb rebuilt with {:.2} s decay", node.decay());
                self.reverb = ReverbSlot::Wired(node);
            }
            Err(err) => log::warn!("reverb rebuild failed ({err}), bypassing reverb"),
        }

        if let ReverbSlot::Wired(node) = old {
            let total = ((CROSSFADE_SECONDS * self.sample_rate) as usize).max(1);
            self.retiring = Some(Retiring {
                node,
                remaining: total,
                total,
            });
        }
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        if resonance.is_finite() {
            self.filter.set_q(resonance_to_q(resonance));
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        if cutoff_hz.is_finite() {
            self.filter.set_cutoff(cutoff_hz);
        }
    }

    /// Set the output level from a [0, 1] slider position.
    pub fn set_volume(&mut self, level: f32) {
        if self.disposed || !level.is_finite() {
            return;
        }
        let level = level.clamp(0.0, 1.0);
        self.volume = Some(level);
        self.output.set_gain(volume_level_to_gain(level));
    }

    pub fn set_muted(&mut self, muted: bool) {
        if !self.disposed {
            self.output.set_muted(muted);
        }
    }

    /// Render one block in place. `modulation` is the modulator's block
    /// average.
    pub fn render(&mut self, block: &mut [f32], modulation: f32) {
        if self.disposed {
            block.fill(0.0);
            return;
        }

        let ctx = RenderCtx::from_freq(self.sample_rate, 0.0, 1.0);
        let base = self.filter.cutoff();
        self.filter
            .apply_modulation(FilterParam::Cutoff, base, modulation * MODULATION_DEPTH_HZ);
        self.filter.render_block(block, &ctx);

        self.render_reverb(block, &ctx);

        self.output.render_block(block, &ctx);
        self.waveform_tap.write(block);
    }

    fn render_reverb(&mut self, block: &mut [f32], ctx: &RenderCtx) {
        let n = block.len();
        let fading = self.retiring.is_some();
        if fading {
            self.dry[..n].copy_from_slice(block);
        }

        if let ReverbSlot::Wired(node) = &mut self.reverb {
            node.render_block(block, ctx);
        }

        let Some(retiring) = &mut self.retiring else {
            return;
        };

        let old = &mut self.retire_buffer[..n];
        old.copy_from_slice(&self.dry[..n]);
        retiring.node.render_block(old, ctx);

        for (sample, old) in block.iter_mut().zip(old.iter()) {
            let g = retiring.remaining as f32 / retiring.total as f32;
            *sample = *sample * (1.0 - g) + old * g;
            retiring.remaining = retiring.remaining.saturating_sub(1);
        }

        if retiring.remaining == 0 {
            self.retiring = None;
        }
    }

    /// Release the reverb, clear the filter, silence the output. Safe to call
    /// more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.reverb = ReverbSlot::Bypassed;
        self.retiring = None;
        self.filter.reset();
        self.output.silence();
        self.waveform_tap.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Decay of the wired reverb, `None` when bypassed.
    pub fn reverb_decay(&self) -> Option<f32> {
        match &self.reverb {
            ReverbSlot::Wired(node) => Some(node.decay()),
            ReverbSlot::Bypassed => None,
        }
    }

    pub fn is_bypassed(&self) -> bool {
        matches!(self.reverb, ReverbSlot::Bypassed)
    }

    pub fn is_crossfading(&self) -> bool {
        self.retiring.is_some()
    }

    /// Output gain once any ramp settles (0 while muted).
    pub fn output_gain(&self) -> f32 {
        self.output.effective_gain()
    }

    /// Last level passed to `set_volume`.
    pub fn volume(&self) -> Option<f32> {
        self.volume
    }

    pub fn filter(&self) -> &FilterNode {
        &self.filter
    }
}
