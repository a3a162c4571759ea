//! Byte magnitude spectrum analysis.
//!
//! Produces the same shape of data as a browser analyser node: a Blackman
//! window, a forward FFT, exponential smoothing across calls, and a linear
//! mapping of decibels onto 0..=255.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::tap::SampleTap;
use crate::error::ConfigError;
use crate::params::FftConfig;

/// Spectrum analyser producing one byte per frequency bin
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    config: FftConfig,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new(config: FftConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Ok(Self {
            fft,
            window,
            time_domain: vec![0.0; size],
            fft_buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            smoothed: vec![0.0; config.bin_count()],
            config,
        })
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Analyse the newest window held by `tap` and write byte magnitudes
    /// into `out` (one per bin; extra entries are left untouched).
    pub fn sample(&mut self, tap: &SampleTap, out: &mut [u8]) {
        let mut time_domain = std::mem::take(&mut self.time_domain);
        tap.snapshot(&mut time_domain);
        self.analyse(&time_domain, out);
        self.time_domain = time_domain;
    }

    /// Analyse an explicit window of `fft_size` samples (zero-padded or
    /// truncated to the newest samples otherwise)
    pub fn analyse(&mut self, samples: &[f32], out: &mut [u8]) {
        let size = self.config.fft_size;
        let offset = size.saturating_sub(samples.len());
        let start = samples.len().saturating_sub(size);

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let value = if i < offset {
                0.0
            } else {
                samples[start + i - offset]
            };
            *slot = Complex::new(value * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        let scale = 1.0 / size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.fft_buffer) {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            // Guard against NaN/inf bleeding into later frames
            if !smoothed.is_finite() {
                *smoothed = 0.0;
            }
        }

        let (min_db, max_db) = (self.config.min_db, self.config.max_db);
        let range_scale = 255.0 / (max_db - min_db);
        for (byte, smoothed) in out.iter_mut().zip(&self.smoothed) {
            *byte = if *smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                ((db - min_db) * range_scale).floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }

    /// Forget smoothing history
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

/// Blackman window coefficient
pub fn blackman_window(index: usize, size: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let phase = 2.0 * PI * index as f32 / size as f32;
    A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyser(smoothing: f32) -> SpectrumAnalyser {
        SpectrumAnalyser::new(FftConfig {
            smoothing_time_constant: smoothing,
            ..FftConfig::default()
        })
        .unwrap()
    }

    fn tone(bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_blackman_window() {
        let size = 256;

        // Blackman window is ~0 at the edge and 1 at the center
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_is_zero() {
        let mut analyser = analyser(0.8);
        let mut out = vec![7u8; 128];
        analyser.analyse(&[0.0; 256], &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_peaks_in_its_bin() {
        let mut analyser = analyser(0.0);
        let mut out = vec![0u8; 128];
        analyser.analyse(&tone(20, 256, 0.05), &mut out);

        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 20);
        assert!(out[20] > out[19] && out[20] > out[21]);
        assert!(out[20] > 200);
        assert_eq!(out[100], 0);
    }

    #[test]
    fn test_smoothing_decays_after_disconnect() {
        let mut analyser = analyser(0.8);
        let mut out = vec![0u8; 128];
        for _ in 0..10 {
            analyser.analyse(&tone(10, 256, 0.05), &mut out);
        }
        let loud = out[10];
        assert!(loud > 0);

        analyser.analyse(&[0.0; 256], &mut out);
        let fading = out[10];
        assert!(fading < loud);
        assert!(fading > 0);

        for _ in 0..200 {
            analyser.analyse(&[0.0; 256], &mut out);
        }
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sample_reads_tap() {
        let mut analyser = analyser(0.0);
        let tap = SampleTap::new(256);
        tap.push_interleaved(&tone(32, 256, 0.5), 1);

        let mut out = vec![0u8; 128];
        analyser.sample(&tap, &mut out);
        assert!(out[32] > 150);
    }
}
