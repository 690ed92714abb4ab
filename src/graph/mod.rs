//! Composable building blocks for constructing audio-processing graphs.
//!
//! Graph nodes wrap the low-level DSP primitives with what voices and buses
//! need: note events, block rendering, and block-rate modulation. The
//! `extensions` module adds fluent helpers so voices read as a signal path.

/// Multiply two signals together (envelope gating).
pub mod amplify;
/// Envelope generator node exposing ADSR state.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.through()`).
pub mod extensions;
/// State-variable filter node with a modulatable cutoff.
pub mod filter;
/// Smoothed output gain with mute.
pub mod gain;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillators and noise.
pub mod oscillator;
/// Wet/dry Schroeder reverb with a fixed decay.
pub mod reverb;
/// Serial chaining of two nodes (source → effect).
pub mod through;

pub use extensions::NodeExt;
pub use node::{GraphNode, Modulatable, RenderCtx};
