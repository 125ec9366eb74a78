//! Log mel spectrogram front end for the offline converter.
//!
//! HTK mel scale, triangular filters spanning 0 Hz to Nyquist, log10 of the
//! band power.

use rustfft::num_complex::Complex;

use crate::core::fft::{SpectralFft, COMPLEX_ZERO};
use crate::core::window::{generate_window, WindowType};

/// Default number of mel bands.
pub const DEFAULT_MEL_BANDS: usize = 80;

/// Added to band energy before the logarithm.
const LOG_FLOOR: f32 = 1e-10;

/// Hz to mel (HTK).
#[inline]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz (HTK).
#[inline]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Windowed-FFT mel filterbank analyser.
pub struct MelSpectrogram {
    fft: SpectralFft,
    num_bands: usize,
    sample_rate: u32,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    power: Vec<f32>,
    /// `num_bands` rows of `num_bins` weights.
    filterbank: Vec<Vec<f32>>,
}

impl MelSpectrogram {
    /// Creates an analyser for frames of `frame_len` samples.
    pub fn new(sample_rate: u32, frame_len: usize, num_bands: usize) -> Self {
        let fft = SpectralFft::new(frame_len);
        let num_bins = fft.num_bins();
        let mut mel = Self {
            fft,
            num_bands,
            sample_rate,
            window: generate_window(WindowType::Hann, frame_len),
            buffer: vec![COMPLEX_ZERO; frame_len],
            power: vec![0.0; num_bins],
            filterbank: Vec::new(),
        };
        mel.build_filterbank();
        mel
    }

    /// Number of mel bands per frame.
    #[inline]
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Frame length.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.fft.size()
    }

    /// Filter weights of one band.
    pub fn filter(&self, band: usize) -> Option<&[f32]> {
        self.filterbank.get(band).map(Vec::as_slice)
    }

    /// Changes the sample rate and rebuilds the filterbank.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.build_filterbank();
        }
    }

    fn build_filterbank(&mut self) {
        let n = self.fft.size();
        let num_bins = self.fft.num_bins();
        let sr = self.sample_rate.max(1) as f32;
        let max_mel = hz_to_mel(sr / 2.0);
        let points = self.num_bands + 2;

        let bins: Vec<usize> = (0..points)
            .map(|i| {
                let mel = max_mel * i as f32 / (self.num_bands + 1) as f32;
                let hz = mel_to_hz(mel);
                (((n + 1) as f32 * hz / sr).floor().max(0.0) as usize).min(num_bins - 1)
            })
            .collect();

        self.filterbank = (0..self.num_bands)
            .map(|band| {
                let (left, center, right) = (bins[band], bins[band + 1], bins[band + 2]);
                let mut row = vec![0.0f32; num_bins];
                if center > left {
                    for (k, w) in row.iter_mut().enumerate().take(center).skip(left) {
                        *w = (k - left) as f32 / (center - left) as f32;
                    }
                }
                if right > center {
                    for (k, w) in row.iter_mut().enumerate().take(right).skip(center) {
                        *w = (right - k) as f32 / (right - center) as f32;
                    }
                }
                row
            })
            .collect();
    }

    /// Analyses one frame into `out` (`num_bands` log10 energies). Frames
    /// shorter than the frame length are zero-padded.
    pub fn process_frame(&mut self, frame: &[f32], out: &mut [f32]) {
        let n = self.fft.size();
        let used = frame.len().min(n);
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = if i < used {
                Complex::new(frame[i] * self.window[i], 0.0)
            } else {
                COMPLEX_ZERO
            };
        }
        self.fft.forward(&mut self.buffer);

        for (p, c) in self.power.iter_mut().zip(self.buffer.iter()) {
            *p = c.norm_sqr();
        }

        for (row, o) in self.filterbank.iter().zip(out.iter_mut()) {
            let energy: f32 = row
                .iter()
                .zip(self.power.iter())
                .map(|(&w, &p)| w * p)
                .sum();
            *o = (energy + LOG_FLOOR).log10();
        }
    }
}

impl std::fmt::Debug for MelSpectrogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MelSpectrogram")
            .field("frame_len", &self.fft.size())
            .field("num_bands", &self.num_bands)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_mel_scale_round_trip_points() {
        assert!(hz_to_mel(0.0).abs() < 1e-6);
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 1.0);
        assert!((mel_to_hz(hz_to_mel(4321.0)) - 4321.0).abs() < 0.5);
    }

    #[test]
    fn test_silence_hits_log_floor() {
        let mut mel = MelSpectrogram::new(44100, 2048, DEFAULT_MEL_BANDS);
        let mut out = vec![0.0; DEFAULT_MEL_BANDS];
        mel.process_frame(&vec![0.0; 2048], &mut out);
        assert!(out.iter().all(|&v| (v + 10.0).abs() < 1e-4));
    }

    #[test]
    fn test_tone_energy_lands_in_matching_band() {
        let mut mel = MelSpectrogram::new(44100, 2048, 40);
        let tone: Vec<f32> = (0..2048)
            .map(|i| (2.0 * PI * 1000.0 * i as f32 / 44100.0).sin())
            .collect();
        let mut out = vec![0.0; 40];
        mel.process_frame(&tone, &mut out);
        let loudest = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let max_mel = hz_to_mel(22050.0);
        let center_hz = mel_to_hz(max_mel * (loudest + 1) as f32 / 41.0);
        assert!(
            (center_hz - 1000.0).abs() < 250.0,
            "loudest band {} centred at {} Hz",
            loudest,
            center_hz
        );
    }

    #[test]
    fn test_short_frame_is_zero_padded() {
        let mut mel = MelSpectrogram::new(44100, 512, 16);
        let mut out = vec![0.0; 16];
        mel.process_frame(&[0.5; 100], &mut out);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_sample_rate_change_rebuilds() {
        let mut mel = MelSpectrogram::new(44100, 1024, 20);
        let before = mel.filter(5).map(|f| f.to_vec());
        mel.set_sample_rate(16000);
        let after = mel.filter(5).map(|f| f.to_vec());
        assert_ne!(before, after);
    }
}
