//! Tempo-locked 16-step drum sequencer.
//!
//! The sequencer owns no clock of its own. The audio graph calls
//! [`StepSequencer::advance`] once per render block with the audio-clock time
//! at the end of the block, and every step scheduled before that time fires
//! with its exact scheduled time. The kit then places each hit on the right
//! sample inside the block, so timing does not depend on block size or on
//! when the control thread got around to sending anything.
//!
//! ```text
//!          load(kind)                        load(None) / stop()
//! Stopped ───────────→ Stopped(armed) ──start()──→ Running ──────────→ Stopped
//!                                          ↑  │
//!                                          └──┘ start() again: no-op
//! ```
//!
//! Loading a different pattern while a bar is in flight stages it; the current
//! bar finishes on the old pattern and the new one takes over at step 0.
//! Loading `PatternKind::None` is not staged: it stops at once, so nothing
//! fires after it (the kit separately drops hits already handed to it).

use crate::sequencing::pattern::{DrumVoice, PatternKind, STEPS};

pub const MIN_TEMPO: f32 = 60.0;
pub const MAX_TEMPO: f32 = 160.0;
pub const DEFAULT_TEMPO: f32 = 110.0;

/// Receiver of sequencer output.
pub trait StepTarget {
    /// A voice hit at `time` (audio-clock seconds).
    fn trigger(&mut self, voice: DrumVoice, time: f64);

    /// An explicit beat, published with every kick.
    fn beat(&mut self, time: f64, velocity: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Stopped,
    Running,
}

/// Length of one sixteenth note in seconds.
#[inline]
pub fn step_duration(tempo: f32) -> f64 {
    60.0 / tempo as f64 / 4.0
}

pub struct StepSequencer {
    state: SequencerState,
    kind: PatternKind,
    staged: Option<PatternKind>,
    tempo: f32,
    next_step: usize,
    next_time: f64,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    pub fn new() -> Self {
        Self {
            state: SequencerState::Stopped,
            kind: PatternKind::None,
            staged: None,
            tempo: DEFAULT_TEMPO,
            next_step: 0,
            next_time: 0.0,
        }
    }

    /// Install a pattern at a tempo. See the module docs for when it takes
    /// effect.
    pub fn load(&mut self, kind: PatternKind, tempo: f32) {
        self.set_tempo(tempo);

        if kind == PatternKind::None {
            self.stop();
            self.kind = PatternKind::None;
            self.staged = None;
            return;
        }

        if self.state == SequencerState::Running && self.next_step != 0 {
            log::debug!("staging pattern {kind} for the next bar");
            self.staged = Some(kind);
        } else {
            self.kind = kind;
            self.staged = None;
        }
    }

    /// Tempo changes apply from the next step on. Clamped to
    /// [`MIN_TEMPO`, `MAX_TEMPO`]; a non-finite tempo is ignored.
    pub fn set_tempo(&mut self, tempo: f32) {
        if tempo.is_finite() {
            self.tempo = tempo.clamp(MIN_TEMPO, MAX_TEMPO);
        }
    }

    /// Begin stepping at `now`. Does nothing when already running or when no
    /// pattern is loaded. Returns whether the sequencer is running afterwards.
    pub fn start(&mut self, now: f64) -> bool {
        if self.state == SequencerState::Running {
            return true;
        }
        if self.kind == PatternKind::None {
            return false;
        }

        self.state = SequencerState::Running;
        self.next_step = 0;
        self.next_time = now;
        true
    }

    pub fn stop(&mut self) {
        self.state = SequencerState::Stopped;
        self.next_step = 0;
        if let Some(kind) = self.staged.take() {
            self.kind = kind;
        }
    }

    /// Fire every step scheduled before `until`.
    pub fn advance<T: StepTarget>(&mut self, until: f64, target: &mut T) {
        while self.state == SequencerState::Running && self.next_time < until {
            self.fire_step(target);

            self.next_time += step_duration(self.tempo);
            self.next_step += 1;
            if self.next_step == STEPS {
                self.next_step = 0;
                if let Some(kind) = self.staged.take() {
                    self.kind = kind;
                }
            }
        }
    }

    fn fire_step<T: StepTarget>(&self, target: &mut T) {
        let Some(pattern) = self.kind.pattern() else {
            return;
        };
        let time = self.next_time;
        let step = self.next_step;

        for voice in [DrumVoice::Kick, DrumVoice::Snare, DrumVoice::HiHat] {
            let cell = pattern.cell(voice, step);
            let Some(velocity) = cell.velocity() else {
                continue;
            };

            target.trigger(voice, time);
            if voice == DrumVoice::Kick {
                target.beat(time, velocity);
            }
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SequencerState::Running
    }

    pub fn pattern(&self) -> PatternKind {
        self.kind
    }

    pub fn staged(&self) -> Option<PatternKind> {
        self.staged
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Step that fires next (0-15).
    pub fn position(&self) -> usize {
        self.next_step
    }
}
