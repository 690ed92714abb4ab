use crate::graph::node::GraphNode;

/// Builds the identical voice graphs a `PolySynth` pre-allocates.
///
/// Any `Fn() -> impl GraphNode` is a factory; the voice bank uses a plain
/// function pointer so its synth type can be named.
pub trait VoiceFactory: Send {
    type Voice: GraphNode;

    fn create_voice(&self) -> Self::Voice;
}

impl<F, T> VoiceFactory for F
where
    F: Fn() -> T + Send,
    T: GraphNode,
{
    type Voice = T;

    fn create_voice(&self) -> Self::Voice {
        self()
    }
}
