/*
Drum Patterns
=============

A pattern is one bar of sixteenth notes: 16 steps, and for each step a cell
per drum voice. A cell is tri-state:

    Off            nothing plays
    On             plays; carries no level of its own (reads as 0.5)
    Velocity(v)    plays, and reports `v` as the beat velocity

The built-in tables mark every hit with the bare number 1, so their kicks
publish beats with velocity 1.0. That value is a marker more than a measured
loudness, and it is kept as-is rather than rescaled to match the velocities
the energy analyzer reports.

    step         0 1 2 3 4 5 6 7 8 9 A B C D E F
    four-on-floor
      kick       x . . . x . . . x . . . x . . .
      snare      . . x . . . x . . . x . . . x .
      hat        . x . x . x . x . x . x . x . x
    dub
      kick       x . . . . . x . . . x . . . . .
      snare      . . . . x . . . . . . . x . . .
      hat        . x . x . x . x . x . x . x . x
    breakbeat
      kick       x . . . . . . x . . x . . . . .
      snare      . . . x . . x . . . . x . . x .
      hat        x . x . x . x . x . x . x . x .
    ambient
      kick       x . . . . . . . x . . . . . . .
      snare      . . . . x . . . . . . . x . . .
      hat        . . x . . . x . . . x . . . x .
*/

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const STEPS: usize = 16;

/// Velocity `On` cells report.
pub const DEFAULT_VELOCITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Off,
    On,
    Velocity(f32),
}

impl Step {
    pub fn is_hit(self) -> bool {
        !matches!(self, Step::Off)
    }

    pub fn velocity(self) -> Option<f32> {
        match self {
            Step::Off => None,
            Step::On => Some(DEFAULT_VELOCITY),
            Step::Velocity(v) => Some(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumVoice {
    Kick,
    Snare,
    HiHat,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternKind {
    #[default]
    None,
    FourOnFloor,
    Dub,
    Breakbeat,
    Ambient,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::None,
        PatternKind::FourOnFloor,
        PatternKind::Dub,
        PatternKind::Breakbeat,
        PatternKind::Ambient,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::None => "none",
            PatternKind::FourOnFloor => "four-on-floor",
            PatternKind::Dub => "dub",
            PatternKind::Breakbeat => "breakbeat",
            PatternKind::Ambient => "ambient",
        }
    }

    /// Next pattern in menu order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn pattern(self) -> Option<&'static Pattern> {
        match self {
            PatternKind::None => None,
            PatternKind::FourOnFloor => Some(&FOUR_ON_FLOOR),
            PatternKind::Dub => Some(&DUB),
            PatternKind::Breakbeat => Some(&BREAKBEAT),
            PatternKind::Ambient => Some(&AMBIENT),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPattern(pub String);

impl fmt::Display for UnknownPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown drum pattern '{}'", self.0)
    }
}

impl std::error::Error for UnknownPattern {}

impl FromStr for PatternKind {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownPattern(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kick: [Step; STEPS],
    pub snare: [Step; STEPS],
    pub hihat: [Step; STEPS],
}

impl Pattern {
    pub fn cell(&self, voice: DrumVoice, step: usize) -> Step {
        let row = match voice {
            DrumVoice::Kick => &self.kick,
            DrumVoice::Snare => &self.snare,
            DrumVoice::HiHat => &self.hihat,
        };
        row[step % STEPS]
    }
}

const X: Step = Step::Velocity(1.0);
const O: Step = Step::Off;

pub static FOUR_ON_FLOOR: Pattern = Pattern {
    kick: [X, O, O, O, X, O, O, O, X, O, O, O, X, O, O, O],
    snare: [O, O, X, O, O, O, X, O, O, O, X, O, O, O, X, O],
    hihat: [O, X, O, X, O, X, O, X, O, X, O, X, O, X, O, X],
};

pub static DUB: Pattern = Pattern {
    kick: [X, O, O, O, O, O, X, O, O, O, X, O, O, O, O, O],
    snare: [O, O, O, O, X, O, O, O, O, O, O, O, X, O, O, O],
    hihat: [O, X, O, X, O, X, O, X, O, X, O, X, O, X, O, X],
};

pub static BREAKBEAT: Pattern = Pattern {
    kick: [X, O, O, O, O, O, O, X, O, O, X, O, O, O, O, O],
    snare: [O, O, O, X, O, O, X, O, O, O, O, X, O, O, X, O],
    hihat: [X, O, X, O, X, O, X, O, X, O, X, O, X, O, X, O],
};

pub static AMBIENT: Pattern = Pattern {
    kick: [X, O, O, O, O, O, O, O, X, O, O, O, O, O, O, O],
    snare: [O, O, O, O, X, O, O, O, O, O, O, O, X, O, O, O],
    hihat: [O, O, X, O, O, O, X, O, O, O, X, O, O, O, X, O],
};
