use std::fmt;

/// The audio backend could not be brought up. Returned from
/// `Engine::initialize` (and from any playback call that auto-initializes);
/// never retried automatically.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupError {
    NoOutputDevice,
    UnsupportedFormat { format: String },
    Config(String),
    Stream(String),
    Play(String),
}

/// A node could not be constructed with the requested parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphError {
    InvalidSampleRate(f32),
    InvalidDecay(f32),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::NoOutputDevice => write!(f, "no audio output device available"),
            StartupError::UnsupportedFormat { format } => {
                write!(f, "unsupported output sample format {format}")
            }
            StartupError::Config(e) => write!(f, "could not query output config: {e}"),
            StartupError::Stream(e) => write!(f, "could not build output stream: {e}"),
            StartupError::Play(e) => write!(f, "could not start output stream: {e}"),
        }
    }
}

impl std::error::Error for StartupError {}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::InvalidSampleRate(sr) => write!(f, "invalid sample rate {sr}"),
            GraphError::InvalidDecay(decay) => write!(f, "invalid reverb decay {decay}s"),
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_backend_detail() {
        let err = StartupError::Stream("device busy".into());
        assert_eq!(err.to_string(), "could not build output stream: device busy");

        let err = GraphError::InvalidDecay(f32::INFINITY);
        assert!(err.to_string().contains("inf"));
    }
}
