//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These components stay focused on the signal-processing math; graph nodes
//! layer note events and block rendering on top. Apart from the reverb's delay
//! lines (sized once, at construction) nothing here allocates while rendering.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Decibel helpers and smoothed gain.
pub mod gain;
/// Inharmonic square bank for metallic percussion.
pub mod metal;
/// Block-rate modulation helpers.
pub mod modulate;
/// Oscillator waveforms and noise sources.
pub mod oscillator;
/// Schroeder reverb with construction-time decay.
pub mod reverb;

pub use envelope::EnvelopeState;
pub use filter::FilterType;
pub use oscillator::OscillatorWaveform;
