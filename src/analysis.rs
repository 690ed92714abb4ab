//! Fixed-size analysis windows shared between the audio and display clocks.
//!
//! The audio side keeps its own ring of the most recent samples and, after
//! each block, tries to copy it (oldest first) into the shared window. It uses
//! `try_lock` and skips the copy if a reader holds the lock; the next block
//! publishes again. The display side locks, copies, and releases. Readers
//! therefore always see a whole window from some recent block, never a torn one.

use std::sync::{Arc, Mutex, TryLockError};

/// Samples in the waveform tap behind the signal chain.
pub const WAVEFORM_WINDOW: usize = 1024;
/// Samples in the beat-energy tap behind the kit's bus filter.
pub const BEAT_WINDOW: usize = 128;

/// Create a connected writer/reader pair over a zeroed window of `len` samples.
pub fn analysis_window(len: usize) -> (AnalysisWriter, AnalysisReader) {
    let len = len.max(1);
    let shared = Arc::new(Mutex::new(vec![0.0; len]));
    let writer = AnalysisWriter {
        shared: Arc::clone(&shared),
        ring: vec![0.0; len],
        pos: 0,
    };
    (writer, AnalysisReader { shared })
}

pub struct AnalysisWriter {
    shared: Arc<Mutex<Vec<f32>>>,
    ring: Vec<f32>,
    pos: usize,
}

impl AnalysisWriter {
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Append a block and publish the window if the reader is not holding it.
    pub fn write(&mut self, samples: &[f32]) {
        let len = self.ring.len();
        // Only the last `len` samples can survive anyway.
        let tail = &samples[samples.len().saturating_sub(len)..];
        for &sample in tail {
            self.ring[self.pos] = sample;
            self.pos = (self.pos + 1) % len;
        }
        self.publish();
    }

    /// Zero the window (the flat line a stopped or disposed source shows).
    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.pos = 0;
        self.publish();
    }

    fn publish(&mut self) {
        let mut window = match self.shared.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let (newer, older) = self.ring.split_at(self.pos);
        window[..older.len()].copy_from_slice(older);
        window[older.len()..].copy_from_slice(newer);
    }
}

#[derive(Clone)]
pub struct AnalysisReader {
    shared: Arc<Mutex<Vec<f32>>>,
}

impl AnalysisReader {
    /// Copy of the latest window, oldest sample first.
    pub fn read(&self) -> Vec<f32> {
        match self.shared.lock() {
            Ok(window) => window.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Copy the latest window into `out` (truncated to the shorter length).
    pub fn read_into(&self, out: &mut [f32]) {
        let window = match self.shared.lock() {
            Ok(window) => window,
            Err(poisoned) => poisoned.into_inner(),
        };
        let n = out.len().min(window.len());
        out[..n].copy_from_slice(&window[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_chronological() {
        let (mut writer, reader) = analysis_window(4);
        writer.write(&[1.0, 2.0, 3.0]);
        assert_eq!(reader.read(), vec![0.0, 1.0, 2.0, 3.0]);

        writer.write(&[4.0, 5.0]);
        assert_eq!(reader.read(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn long_blocks_keep_the_tail() {
        let (mut writer, reader) = analysis_window(3);
        writer.write(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(reader.read(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn writer_skips_while_reader_holds_lock() {
        let (mut writer, reader) = analysis_window(2);
        {
            let _held = reader.shared.lock().unwrap();
            writer.write(&[1.0, 1.0]);
        }
        assert_eq!(reader.read(), vec![0.0, 0.0]);

        writer.write(&[2.0]);
        assert_eq!(reader.read(), vec![1.0, 2.0]);
    }

    #[test]
    fn clear_gives_flat_line() {
        let (mut writer, reader) = analysis_window(WAVEFORM_WINDOW);
        writer.write(&[0.5; 64]);
        writer.clear();
        assert!(reader.read().iter().all(|&s| s == 0.0));
        assert_eq!(reader.read().len(), WAVEFORM_WINDOW);
    }
}
