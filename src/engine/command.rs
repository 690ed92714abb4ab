use crate::config::{DrumChange, DrumConfig, SoundParameters, TimbreConfig};
use crate::error::GraphError;
use crate::graph::reverb::ReverbNode;

/// Control → audio messages. Sent fire-and-forget over the command ring and
/// applied at the start of the next render block.
pub enum EngineCommand {
    /// Release what is sounding, then start a new chord (and the drums if a
    /// pattern is selected).
    Play(SoundParameters),
    /// Release voices, stop the sequencer, drop pending drum hits.
    Stop,
    /// New timbre. A rebuilt reverb travels with it when the decay changed,
    /// built on the control thread so the audio thread never allocates one.
    SetTimbre {
        config: TimbreConfig,
        reverb: Option<Result<Box<ReverbNode>, GraphError>>,
    },
    SetDrums {
        config: DrumConfig,
        change: DrumChange,
    },
    /// Slider position in [0, 1].
    SetVolume(f32),
    /// Mutes the tone and the drum bus together.
    SetMuted(bool),
    /// Release every node. The graph renders silence from then on.
    Dispose,
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Play(params) => f.debug_tuple("Play").field(params).finish(),
            Self::Stop => f.write_str("Stop"),
            Self::SetTimbre { config, reverb } => f
                .debug_struct("SetTimbre")
                .field("config", config)
                .field("rebuild_reverb", &reverb.is_some())
                .finish(),
            Self::SetDrums { config, change } => f
                .debug_struct("SetDrums")
                .field("config", config)
                .field("change", change)
                .finish(),
            Self::SetVolume(level) => f.debug_tuple("SetVolume").field(level).finish(),
            Self::SetMuted(muted) => f.debug_tuple("SetMuted").field(muted).finish(),
            Self::Dispose => f.write_str("Dispose"),
        }
    }
}
