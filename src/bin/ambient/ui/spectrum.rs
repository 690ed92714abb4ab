//! FFT spectrum of the output window.
//!
//! Bins are spaced logarithmically from 20 Hz to Nyquist (capped at 20 kHz),
//! and each one falls back slowly after a peak so the plot reads as a meter
//! instead of flickering frame to frame.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const BANDS: usize = 48;
const FLOOR_DB: f64 = -100.0;
/// dB a band may drop per frame.
const FALL_DB: f64 = 3.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each band.
    bins: Vec<usize>,
    /// (frequency, level dB) per band.
    bands: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(window_len: usize, sample_rate: f32) -> Self {
        let window_len = window_len.max(2);
        let fft = FftPlanner::new().plan_fft_forward(window_len);

        let span = (window_len - 1) as f32;
        let hann = (0..window_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / span).cos()))
            .collect();

        let nyquist = (sample_rate as f64 / 2.0).clamp(40.0, 20_000.0);
        let lowest = 20.0;
        let last_bin = window_len / 2 - 1;

        let mut bins = Vec::with_capacity(BANDS);
        let mut bands = Vec::with_capacity(BANDS);
        for band in 0..BANDS {
            let t = band as f64 / (BANDS - 1) as f64;
            let freq = lowest * (nyquist / lowest).powf(t);
            let bin = (freq * window_len as f64 / sample_rate as f64).round() as usize;
            bins.push(bin.clamp(1, last_bin.max(1)));
            bands.push((freq, FLOOR_DB));
        }

        Self {
            fft,
            hann,
            scratch: vec![Complex::new(0.0, 0.0); window_len],
            bins,
            bands,
        }
    }

    /// Analyze a fresh output window. Windows of the wrong length are ignored.
    pub fn update(&mut self, window: &[f32]) {
        if window.len() != self.hann.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(window).zip(&self.hann) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = (self.hann.len() / 2) as f32;
        for ((_, level), &bin) in self.bands.iter_mut().zip(&self.bins) {
            let magnitude = (self.scratch[bin].norm() / norm).max(1e-6);
            let db = (20.0 * magnitude.log10()) as f64;
            *level = db.max(*level - FALL_DB).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.bands
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, bands: &[(f64, f64)]) {
    // plot against log frequency so the bands sit evenly across the width
    let points: Vec<(f64, f64)> = bands.iter().map(|&(f, db)| (f.log10(), db)).collect();
    let (low, high) = match (points.first(), points.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        _ => (0.0, 1.0),
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec!["20", "1k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
