//! Percussion kit: kick, snare and hi-hat on a shared bus.

/*
Kit Layout
==========

    kick  ─┐
    snare ─┼─→ Σ ─→ bus lowpass (drum_filter, Q 1) ─┬─→ bus gain (drum_volume, mute) ─→ out
    hihat ─┘                                        └─→ beat window (128 samples)

Triggers carry an audio-clock time in seconds. They are turned into absolute
sample frames and queued; `render` cuts the block at every queued frame so a
hit starts on exactly the sample it was scheduled for, whatever the block size.

    block:  |-------- 512 frames --------|
    events:        ↑ kick on    ↑ hat off
    render: [ 0..180 ][ 180..377 ][ 377..512 ]

Every note-on is paired with a note-off one note length later (an eighth for
kick and snare, a thirty-second for the hi-hat), measured at the tempo in force
when the hit was scheduled. Both carry the same hit id, and a note-off only
acts while its hit is the one the voice is playing: a newer hit on the same
voice is never released by an older hit's note-off. A hit is queued only when
both of its events fit.

Cancelling drops the note-ons that have not fired yet but keeps the note-offs,
so anything already sounding still releases.

Events in the past (a trigger that arrives late) fire at the start of the next
block instead of being lost.
*/

use crate::analysis::{analysis_window, AnalysisReader, AnalysisWriter, BEAT_WINDOW};
use crate::config::DrumConfig;
use crate::engine::scheduler::Scheduler;
use crate::graph::{filter::FilterNode, gain::GainNode, GraphNode, RenderCtx};
use crate::sequencing::pattern::DrumVoice;
use crate::sequencing::sequencer::{MAX_TEMPO, MIN_TEMPO};
use crate::voices::{hihat, kick, snare, KICK_PITCH};
use crate::MAX_BLOCK_SIZE;

/// Room for a few bars of hits plus their note-offs.
const EVENT_CAPACITY: usize = 256;
const HIT_VELOCITY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KitEvent {
    NoteOn { voice: DrumVoice, hit: u64 },
    NoteOff { voice: DrumVoice, hit: u64 },
}

fn slot(voice: DrumVoice) -> usize {
    match voice {
        DrumVoice::Kick => 0,
        DrumVoice::Snare => 1,
        DrumVoice::HiHat => 2,
    }
}

pub struct DrumKit {
    kick: Box<dyn GraphNode>,
    snare: Box<dyn GraphNode>,
    hihat: Box<dyn GraphNode>,
    events: Scheduler<KitEvent>,
    next_hit: u64,
    /// Hit each voice is holding, until its note-off.
    held: [Option<u64>; 3],
    bus_filter: FilterNode,
    bus_gain: GainNode,
    beat_tap: AnalysisWriter,
    tempo: f32,
    sample_rate: f32,
    voice_buffer: Vec<f32>,
    frame: u64,
}

impl DrumKit {
    /// Build the kit and the reader side of its beat window.
    pub fn new(sample_rate: f32, config: &DrumConfig) -> (Self, AnalysisReader) {
        let (beat_tap, reader) = analysis_window(BEAT_WINDOW);

        let mut bus_filter = FilterNode::lowpass(config.filter);
        bus_filter.set_q(1.0);

        let kit = Self {
            kick: Box::new(kick()),
            snare: Box::new(snare()),
            hihat: Box::new(hihat()),
            events: Scheduler::with_capacity(EVENT_CAPACITY),
            next_hit: 0,
            held: [None; 3],
            bus_filter,
            bus_gain: GainNode::new(config.volume),
            beat_tap,
            tempo: config.tempo.clamp(MIN_TEMPO, MAX_TEMPO),
            sample_rate,
            voice_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frame: 0,
        };
        (kit, reader)
    }

    pub fn trigger_kick(&mut self, time: f64) {
        self.trigger(DrumVoice::Kick, time);
    }

    pub fn trigger_snare(&mut self, time: f64) {
        self.trigger(DrumVoice::Snare, time);
    }

    pub fn trigger_hihat(&mut self, time: f64) {
        self.trigger(DrumVoice::HiHat, time);
    }

    /// Schedule a hit at `time` (audio-clock seconds) and its note-off.
    pub fn trigger(&mut self, voice: DrumVoice, time: f64) {
        let on = self.time_to_frame(time);
        let off = on + self.time_to_frame(self.note_length(voice));

        if self.events.available() < 2 {
            log::debug!("kit event queue full, dropping {voice:?}");
            return;
        }
        let hit = self.next_hit;
        self.next_hit += 1;
        self.events.enqueue(on, KitEvent::NoteOn { voice, hit });
        self.events.enqueue(off, KitEvent::NoteOff { voice, hit });
    }

    /// Seconds a hit is held before its note-off.
    pub fn note_length(&self, voice: DrumVoice) -> f64 {
        let beat = 60.0 / self.tempo as f64;
        match voice {
            DrumVoice::Kick | DrumVoice::Snare => beat / 2.0,
            DrumVoice::HiHat => beat / 8.0,
        }
    }

    /// Drop every hit that has not started yet. Pending note-offs stay.
    pub fn cancel_pending(&mut self) {
        self.events.retain(|e| matches!(e.event, KitEvent::NoteOff { .. }));
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Whether `voice` is between a note-on and its note-off.
    pub fn is_held(&self, voice: DrumVoice) -> bool {
        self.held[slot(voice)].is_some()
    }

    pub fn set_tempo(&mut self, tempo: f32) {
        if tempo.is_finite() {
            self.tempo = tempo.clamp(MIN_TEMPO, MAX_TEMPO);
        }
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    /// Linear bus gain.
    pub fn set_bus_volume(&mut self, volume: f32) {
        self.bus_gain.set_gain(volume.clamp(0.0, 1.0));
    }

    pub fn set_bus_filter(&mut self, cutoff_hz: f32) {
        self.bus_filter.set_cutoff(cutoff_hz);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.bus_gain.set_muted(muted);
    }

    pub fn bus_volume(&self) -> f32 {
        self.bus_gain.gain()
    }

    pub fn bus_filter(&self) -> f32 {
        self.bus_filter.cutoff()
    }

    pub fn is_muted(&self) -> bool {
        self.bus_gain.is_muted()
    }

    /// Sample frame the next rendered block starts at.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Render the kit, replacing the contents of `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let len = out.len();
        let block_end = self.frame + len as u64;

        let mut offset = 0;
        while offset < len {
            let now = self.frame + offset as u64;
            while let Some(due) = self.events.pop_due(now) {
                self.apply(due.event, now);
            }

            let end = match self.events.next_frame() {
                Some(frame) if frame < block_end => (frame - self.frame) as usize,
                _ => len,
            };
            self.render_voices(&mut out[offset..end], now);
            offset = end;
        }

        let ctx = RenderCtx::from_freq(self.sample_rate, 0.0, HIT_VELOCITY);
        self.bus_filter.render_block(out, &ctx);
        self.beat_tap.write(out);
        self.bus_gain.render_block(out, &ctx);

        self.frame = block_end;
    }

    /// Release every voice and forget queued events.
    pub fn reset(&mut self) {
        self.events.clear();
        self.held = [None; 3];
        self.bus_filter.reset();
        self.beat_tap.clear();
        for voice in [DrumVoice::Kick, DrumVoice::Snare, DrumVoice::HiHat] {
            let ctx = self.voice_ctx(voice, self.frame);
            self.voice_mut(voice).note_off(&ctx);
        }
    }

    fn apply(&mut self, event: KitEvent, frame: u64) {
        match event {
            KitEvent::NoteOn { voice, hit } => {
                self.held[slot(voice)] = Some(hit);
                let ctx = self.voice_ctx(voice, frame);
                self.voice_mut(voice).note_on(&ctx);
            }
            KitEvent::NoteOff { voice, hit } => {
                if self.held[slot(voice)] != Some(hit) {
                    return;
                }
                self.held[slot(voice)] = None;
                let ctx = self.voice_ctx(voice, frame);
                self.voice_mut(voice).note_off(&ctx);
            }
        }
    }

    fn render_voices(&mut self, out: &mut [f32], frame: u64) {
        for voice in [DrumVoice::Kick, DrumVoice::Snare, DrumVoice::HiHat] {
            let ctx = self.voice_ctx(voice, frame);
            let buffer = &mut self.voice_buffer[..out.len()];
            let node = match voice {
                DrumVoice::Kick => &mut self.kick,
                DrumVoice::Snare => &mut self.snare,
                DrumVoice::HiHat => &mut self.hihat,
            };
            if !node.is_active() {
                continue;
            }

            buffer.fill(0.0);
            node.render_block(buffer, &ctx);
            for (o, s) in out.iter_mut().zip(buffer.iter()) {
                *o += s;
            }
        }
    }

    fn voice_mut(&mut self, voice: DrumVoice) -> &mut Box<dyn GraphNode> {
        match voice {
            DrumVoice::Kick => &mut self.kick,
            DrumVoice::Snare => &mut self.snare,
            DrumVoice::HiHat => &mut self.hihat,
        }
    }

    fn voice_ctx(&self, voice: DrumVoice, frame: u64) -> RenderCtx {
        // Snare and hat ignore pitch; the kick is always struck at C1.
        let frequency = match voice {
            DrumVoice::Kick => KICK_PITCH,
            DrumVoice::Snare | DrumVoice::HiHat => 0.0,
        };
        RenderCtx::from_freq(self.sample_rate, frequency, HIT_VELOCITY)
            .at(frame as f64 / self.sample_rate as f64)
    }

    fn time_to_frame(&self, time: f64) -> u64 {
        if time.is_finite() && time > 0.0 {
            (time * self.sample_rate as f64).round() as u64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn kit() -> (DrumKit, AnalysisReader) {
        DrumKit::new(SR, &DrumConfig::default())
    }

    fn first_nonzero(buffer: &[f32]) -> Option<usize> {
        buffer.iter().position(|&s| s != 0.0)
    }

    #[test]
    fn hit_starts_on_its_sample() {
        let (mut kit, _) = kit();
        kit.trigger_snare(300.0 / SR as f64);

        let mut out = vec![0.0; 256];
        kit.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        kit.render(&mut out);
        let start = first_nonzero(&out).expect("snare should sound in second block");
        assert!((44..=46).contains(&start), "snare started at {start}");
    }

    #[test]
    fn hit_position_does_not_depend_on_block_size() {
        let onset = |block: usize| {
            let (mut kit, _) = kit();
            kit.trigger_snare(0.01);

            let mut rendered = Vec::new();
            let mut out = vec![0.0; block];
            while rendered.len() < 1024 {
                kit.render(&mut out);
                rendered.extend_from_slice(&out);
            }
            first_nonzero(&rendered)
        };

        assert_eq!(onset(64), onset(512));
        assert_eq!(onset(64), onset(1000));
    }

    #[test]
    fn note_lengths_follow_tempo() {
        let (mut kit, _) = kit();
        kit.set_tempo(120.0);
        assert!((kit.note_length(DrumVoice::Kick) - 0.25).abs() < 1e-9);
        assert!((kit.note_length(DrumVoice::HiHat) - 0.0625).abs() < 1e-9);
    }

    #[test]
    fn cancel_keeps_note_offs() {
        let (mut kit, _) = kit();
        kit.trigger_hihat(0.0);
        kit.trigger_snare(1.0);

        let mut out = vec![0.0; 128];
        kit.render(&mut out);
        assert_eq!(kit.pending(), 3);

        kit.cancel_pending();
        assert_eq!(kit.pending(), 1, "only the hi-hat note-off should remain");

        let mut heard_snare = false;
        for _ in 0..500 {
            kit.render(&mut out);
            let t = kit.frame() as f64 / SR as f64;
            if t > 1.0 && t < 1.2 && out.iter().any(|s| s.abs() > 1e-3) {
                heard_snare = true;
            }
        }
        assert!(!heard_snare);
        assert_eq!(kit.pending(), 0);
    }

    #[test]
    fn stale_note_off_leaves_newer_hit_alone() {
        let (mut kit, _) = kit();
        kit.set_tempo(120.0);
        // kick at 0 releases at 0.25 s
        kit.trigger_kick(0.0);

        let mut out = vec![0.0; 480];
        for _ in 0..10 {
            kit.render(&mut out);
        }
        kit.cancel_pending();
        // restruck at 0.2 s, releases at 0.45 s
        kit.trigger_kick(0.2);

        while kit.frame() < (0.3 * SR as f64) as u64 {
            kit.render(&mut out);
        }
        assert!(kit.is_held(DrumVoice::Kick), "old note-off released the new kick");
        assert_eq!(kit.pending(), 1);

        while kit.frame() < (0.5 * SR as f64) as u64 {
            kit.render(&mut out);
        }
        assert!(!kit.is_held(DrumVoice::Kick));
        assert_eq!(kit.pending(), 0);
    }

    #[test]
    fn hit_is_dropped_whole_when_queue_cannot_take_both_events() {
        let (mut kit, _) = kit();
        kit.trigger_hihat(0.0);
        for _ in 1..EVENT_CAPACITY / 2 {
            kit.trigger_hihat(1.0);
        }
        assert_eq!(kit.pending(), EVENT_CAPACITY);

        // the first note-on fires, leaving one free slot
        let mut out = vec![0.0; 64];
        kit.render(&mut out);
        assert_eq!(kit.pending(), EVENT_CAPACITY - 1);

        kit.trigger_snare(2.0);
        assert_eq!(kit.pending(), EVENT_CAPACITY - 1);
    }

    #[test]
    fn late_trigger_fires_next_block() {
        let (mut kit, _) = kit();
        let mut out = vec![0.0; 512];
        kit.render(&mut out);

        kit.trigger_snare(0.0);
        kit.render(&mut out);
        assert!(out[1..8].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn mute_silences_bus_but_not_beat_window() {
        let (mut kit, beat_window) = kit();
        kit.set_muted(true);
        kit.trigger_kick(0.0);

        let mut out = vec![0.0; 2048];
        kit.render(&mut out);
        kit.render(&mut out);

        assert!(out.iter().all(|&s| s == 0.0));
        assert!(beat_window.read().iter().any(|&s| s != 0.0));
        assert_eq!(kit.bus_volume(), 0.5);
    }
}
