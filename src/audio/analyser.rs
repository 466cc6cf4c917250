//! Spectrum analysis producing byte-scaled frequency snapshots.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::params::{AnalyserConfig, ANALYSER_FFT_SIZE, FREQUENCY_BIN_COUNT};

/// Windowed FFT analyser with temporal smoothing
///
/// Each call to [`SpectrumAnalyser::analyse`] refreshes the snapshot in place;
/// the returned slice borrows that buffer and is only valid until the next call.
pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes carried between frames
    smoothed: Vec<f32>,
    snapshot: Vec<u8>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(ANALYSER_FFT_SIZE);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let window = (0..ANALYSER_FFT_SIZE)
            .map(|i| blackman_window(i, ANALYSER_FFT_SIZE))
            .collect();

        Self {
            config,
            fft,
            window,
            spectrum: vec![Complex::new(0.0, 0.0); ANALYSER_FFT_SIZE],
            scratch,
            smoothed: vec![0.0; FREQUENCY_BIN_COUNT],
            snapshot: vec![0; FREQUENCY_BIN_COUNT],
        }
    }

    /// Analyse the most recent `ANALYSER_FFT_SIZE` samples
    ///
    /// `time_domain` shorter than the window is treated as zero-padded at the
    /// front (older than anything played); longer input uses its tail.
    pub fn analyse(&mut self, time_domain: &[f32]) -> &[u8] {
        let n = ANALYSER_FFT_SIZE;
        let tail = &time_domain[time_domain.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, slot) in self.spectrum.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        let db_range = self.config.max_decibels - self.config.min_decibels;

        for k in 0..FREQUENCY_BIN_COUNT {
            let magnitude = self.spectrum[k].norm() / n as f32;
            let smoothed = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = if smoothed.is_finite() { smoothed } else { 0.0 };

            self.snapshot[k] = magnitude_to_byte(
                self.smoothed[k],
                self.config.min_decibels,
                db_range,
            );
        }

        &self.snapshot
    }
}

/// Map a linear magnitude onto 0..=255 through the configured decibel window
fn magnitude_to_byte(magnitude: f32, min_decibels: f32, db_range: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (255.0 / db_range) * (db - min_decibels);
    scaled.clamp(0.0, 255.0) as u8
}

/// Blackman window function for FFT analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}
