// Voice management and polyphony.
// This layer sits above graph nodes and owns whole voices.

pub mod bank;
pub mod factory;
pub mod poly;
pub mod voice;

pub use bank::VoiceBank;
pub use factory::VoiceFactory;
pub use poly::PolySynth;
pub use voice::{Voice, VoiceState};
