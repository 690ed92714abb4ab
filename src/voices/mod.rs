//! Pre-built voices.
//!
//! Each voice is a ready-to-use node graph:
//!
//! ```ignore
//! use ambient_dsp::voices;
//!
//! let kick = voices::kick();
//! let snare = voices::snare();
//! let hihat = voices::hihat();
//! let pad = voices::tone(OscillatorWaveform::Sine, 0.5, 2.0);
//! ```

mod hihat;
mod kick;
mod snare;
pub mod tone;

pub use hihat::{hihat, MetalNode};
pub use kick::{kick, MembraneNode, KICK_PITCH};
pub use snare::snare;
pub use tone::{modulator, tone, ToneVoice};
