use crate::{
    synth::{
        factory::VoiceFactory,
        voice::{Voice, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/// Fixed pool of voices built once from a factory.
///
/// Allocation takes a free voice if there is one, otherwise steals the oldest
/// voice that is already releasing. Voices still held are never stolen; if
/// every voice is held the note is dropped.
pub struct PolySynth<F: VoiceFactory> {
    voices: Vec<Voice<F::Voice>>,
    temp_buffer: Vec<f32>,
    next_age: u64,
}

impl<F: VoiceFactory> PolySynth<F> {
    pub fn new(factory: F, sample_rate: f32, max_voices: usize) -> Self {
        let voices = (0..max_voices)
            .map(|_| Voice::new(factory.create_voice(), sample_rate))
            .collect();

        Self {
            voices,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
            next_age: 0,
        }
    }

    /// Start a note. Returns false when no voice could be allocated.
    pub fn note_on(&mut self, frequency: f32, velocity: f32) -> bool {
        let age = self.next_age;
        self.next_age += 1;

        match self.allocate_voice() {
            Some(voice) => {
                voice.start(frequency, velocity, age);
                true
            }
            None => {
                log::debug!("voice pool exhausted, dropping {frequency:.1} Hz");
                false
            }
        }
    }

    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Silence and free every voice immediately.
    pub fn free_all(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
    }

    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        for voice in &mut self.voices {
            if voice.is_active() {
                let frames = &mut self.temp_buffer[..out.len()];
                frames.fill(0.0);
                voice.render(frames);

                for (o, v) in out.iter_mut().zip(frames.iter()) {
                    *o += v;
                }
            }
        }
    }

    pub fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice<F::Voice>> {
        self.voices.iter_mut()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn held_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.state() == VoiceState::Active)
            .count()
    }

    fn allocate_voice(&mut self) -> Option<&mut Voice<F::Voice>> {
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(&mut self.voices[idx]);
        }

        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorWaveform;
    use crate::voices::{tone, ToneVoice};

    fn slow_release() -> ToneVoice {
        tone(OscillatorWaveform::Sine, 0.001, 5.0)
    }

    #[test]
    fn steals_oldest_releasing_voice() {
        let mut synth = PolySynth::new(slow_release as fn() -> ToneVoice, 48_000.0, 2);
        assert!(synth.note_on(100.0, 1.0));
        assert!(synth.note_on(200.0, 1.0));
        synth.release_all();

        assert!(synth.note_on(300.0, 1.0));
        let frequencies: Vec<f32> = synth.voices_mut().map(|v| v.frequency()).collect();
        assert_eq!(frequencies, vec![300.0, 200.0]);
    }

    #[test]
    fn held_voices_are_never_stolen() {
        let mut synth = PolySynth::new(slow_release as fn() -> ToneVoice, 48_000.0, 2);
        assert!(synth.note_on(100.0, 1.0));
        assert!(synth.note_on(200.0, 1.0));
        assert!(!synth.note_on(300.0, 1.0));
        assert_eq!(synth.held_voices(), 2);
    }

    #[test]
    fn release_keeps_voices_sounding() {
        let mut synth = PolySynth::new(slow_release as fn() -> ToneVoice, 48_000.0, 4);
        synth.note_on(220.0, 1.0);

        let mut buffer = vec![0.0f32; 512];
        synth.render_block(&mut buffer);
        synth.release_all();
        synth.render_block(&mut buffer);

        assert_eq!(synth.active_voices(), 1);
        assert!(buffer.iter().any(|s| s.abs() > 0.1), "release must not hard-cut");
    }
}
