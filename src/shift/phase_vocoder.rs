//! Phase vocoder pitch and formant shifting for one fixed-size frame.
//!
//! Each call analyses a frame, tracks per-bin instantaneous frequency against
//! the previous hop, moves bins by the pitch ratio with phase accumulation,
//! optionally re-shapes the result with the formant envelope, and returns the
//! windowed resynthesis. The caller overlap-adds the output using
//! [`PhaseVocoder::synthesis_weights`] as the normalization weight.

use rustfft::num_complex::Complex;
use std::f32::consts::PI;

use crate::analysis::transient::TransientDetector;
use crate::core::fft::{wrap_phase, SpectralFft, COMPLEX_ZERO};
use crate::core::types::{clamp_ratio, EngineConfig};
use crate::core::window::{apply_window_into, generate_window, squared_window, WindowType};
use crate::shift::envelope::FormantEnvelope;

const TWO_PI: f32 = 2.0 * PI;

/// Ratios within this distance of 1 count as "no shift".
pub const RATIO_TOLERANCE: f32 = 0.01;

/// What the last [`PhaseVocoder::process_frame`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Transient gate suppressed the pitch shift.
    pub bypassed: bool,
    /// Pitch ratio actually applied.
    pub pitch_ratio: f32,
    /// Formant ratio actually applied (1 when the formant stage was skipped).
    pub formant_ratio: f32,
    /// Strength reported by the transient detector.
    pub transient_strength: f32,
}

/// Phase vocoder state for one frame size.
pub struct PhaseVocoder {
    frame_len: usize,
    hop: usize,
    fft: SpectralFft,
    window: Vec<f32>,
    weights: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    windowed: Vec<f32>,
    /// Expected phase advance of each bin centre over one hop.
    expected: Vec<f32>,
    magnitude: Vec<f32>,
    phase: Vec<f32>,
    /// Measured phase advance over the last hop.
    advance: Vec<f32>,
    last_phase: Vec<f32>,
    sum_phase: Vec<f32>,
    target_mag: Vec<f32>,
    target_adv: Vec<f32>,
    /// Distance from each target bin to its nearest contributing source.
    target_dist: Vec<f32>,
    envelope: FormantEnvelope,
    transient: TransientDetector,
    bypass_on_transient: bool,
    preserve_formants: bool,
    report: FrameReport,
}

impl PhaseVocoder {
    /// Builds a vocoder from an engine configuration. The configuration is
    /// expected to be validated.
    pub fn new(config: &EngineConfig) -> Self {
        let frame_len = config.frame_len;
        let hop = config.hop;
        let fft = SpectralFft::new(frame_len);
        let num_bins = fft.num_bins();
        let window = generate_window(WindowType::PeriodicHann, frame_len);
        let weights = squared_window(&window);

        let expected: Vec<f32> = (0..num_bins)
            .map(|bin| TWO_PI * bin as f32 * hop as f32 / frame_len as f32)
            .collect();

        Self {
            frame_len,
            hop,
            fft,
            window,
            weights,
            spectrum: vec![COMPLEX_ZERO; frame_len],
            windowed: vec![0.0; frame_len],
            expected,
            magnitude: vec![0.0; num_bins],
            phase: vec![0.0; num_bins],
            advance: vec![0.0; num_bins],
            last_phase: vec![0.0; num_bins],
            sum_phase: vec![0.0; num_bins],
            target_mag: vec![0.0; num_bins],
            target_adv: vec![0.0; num_bins],
            target_dist: vec![f32::INFINITY; num_bins],
            envelope: FormantEnvelope::new(
                config.envelope,
                config.lpc_order,
                config.sample_rate,
                frame_len,
            ),
            transient: TransientDetector::new(config.transient_threshold),
            bypass_on_transient: config.bypass_on_transient,
            preserve_formants: config.preserve_formants,
            report: FrameReport::default(),
        }
    }

    /// Frame length.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Analysis hop.
    #[inline]
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of non-negative frequency bins.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.magnitude.len()
    }

    /// Effective window of an unmodified frame (analysis x synthesis). This
    /// is the weight an overlap-add stage must accumulate for each output
    /// sample.
    #[inline]
    pub fn synthesis_weights(&self) -> &[f32] {
        &self.weights
    }

    /// Summary of the last processed frame.
    #[inline]
    pub fn last_report(&self) -> FrameReport {
        self.report
    }

    /// Formant envelope of the last frame that ran the formant stage.
    #[inline]
    pub fn envelope(&self) -> &FormantEnvelope {
        &self.envelope
    }

    /// Shifts one frame. `frame` and `out` must both hold `frame_len` samples.
    ///
    /// Ratios are clamped to `[0.25, 4]`. When the transient gate fires on a
    /// frame that asks for a pitch change, the pitch stage runs as identity
    /// and the synthesis phase re-locks to the analysis phase; the formant
    /// stage still runs.
    pub fn process_frame(&mut self, frame: &[f32], pitch_ratio: f32, formant_ratio: f32, out: &mut [f32]) {
        let n = self.frame_len;
        if frame.len() < n || out.len() < n {
            let len = frame.len().min(out.len());
            out[..len].copy_from_slice(&frame[..len]);
            return;
        }

        let mut pitch_ratio = clamp_ratio(pitch_ratio);
        let formant_ratio = clamp_ratio(formant_ratio);
        let pitch_active = (pitch_ratio - 1.0).abs() > RATIO_TOLERANCE;

        let mut bypassed = false;
        let mut strength = 0.0;
        if self.bypass_on_transient {
            let is_transient = self.transient.detect(&frame[..n]);
            strength = self.transient.strength();
            if is_transient && pitch_active {
                bypassed = true;
                pitch_ratio = 1.0;
            }
        }

        let formant_active = (formant_ratio - 1.0).abs() > RATIO_TOLERANCE
            || (self.preserve_formants && !bypassed && pitch_active);

        self.analyze(&frame[..n]);

        let unity_pitch = bypassed || (pitch_ratio - 1.0).abs() <= f32::EPSILON;
        if unity_pitch {
            // Re-lock synthesis phase to the analysis phase.
            self.sum_phase.copy_from_slice(&self.phase);
        }

        self.report = FrameReport {
            bypassed,
            pitch_ratio,
            formant_ratio: if formant_active { formant_ratio } else { 1.0 },
            transient_strength: strength,
        };

        if unity_pitch && !formant_active {
            for ((o, &x), &w) in out[..n].iter_mut().zip(frame.iter()).zip(self.weights.iter()) {
                *o = x * w;
            }
            return;
        }

        if unity_pitch {
            self.target_mag.copy_from_slice(&self.magnitude);
        } else {
            self.remap_bins(pitch_ratio);
        }

        if formant_active {
            self.envelope.estimate(&self.windowed, &self.magnitude);
            let displaced_by = if self.preserve_formants && !unity_pitch {
                Some(pitch_ratio)
            } else {
                None
            };
            self.envelope.warp(&mut self.target_mag, formant_ratio, displaced_by);
        }

        self.synthesize(&mut out[..n]);
    }

    /// Windows and transforms the frame, filling magnitude, phase and the
    /// measured phase advance, and updating `last_phase`.
    fn analyze(&mut self, frame: &[f32]) {
        apply_window_into(frame, &self.window, &mut self.windowed);
        for (c, &x) in self.spectrum.iter_mut().zip(self.windowed.iter()) {
            *c = Complex::new(x, 0.0);
        }
        self.fft.forward(&mut self.spectrum);

        for bin in 0..self.magnitude.len() {
            let c = self.spectrum[bin];
            let phase = c.arg();
            self.magnitude[bin] = c.norm();
            self.phase[bin] = phase;

            let expected = self.expected[bin];
            let deviation = wrap_phase(phase - self.last_phase[bin] - expected);
            self.advance[bin] = expected + deviation;
            self.last_phase[bin] = phase;
        }
    }

    /// Moves source bin `k` to position `k * ratio`, splitting its magnitude
    /// between the two neighbouring target bins, and advances each target
    /// bin's phase by its nearest source's advance scaled by the ratio.
    fn remap_bins(&mut self, ratio: f32) {
        let num_bins = self.magnitude.len();
        self.target_mag.iter_mut().for_each(|m| *m = 0.0);
        self.target_dist.iter_mut().for_each(|d| *d = f32::INFINITY);

        for k in 0..num_bins {
            let position = k as f32 * ratio;
            let lower = position.floor() as usize;
            if lower >= num_bins {
                break;
            }
            let frac = position - lower as f32;
            let mag = self.magnitude[k];
            let adv = self.advance[k] * ratio;

            self.target_mag[lower] += mag * (1.0 - frac);
            if frac < self.target_dist[lower] {
                self.target_dist[lower] = frac;
                self.target_adv[lower] = adv;
            }

            let upper = lower + 1;
            if upper < num_bins && frac > 0.0 {
                self.target_mag[upper] += mag * frac;
                let dist = 1.0 - frac;
                if dist < self.target_dist[upper] {
                    self.target_dist[upper] = dist;
                    self.target_adv[upper] = adv;
                }
            }
        }

        for bin in 0..num_bins {
            let adv = if self.target_dist[bin].is_finite() {
                self.target_adv[bin]
            } else {
                self.expected[bin]
            };
            self.sum_phase[bin] = wrap_phase(self.sum_phase[bin] + adv);
        }
    }

    /// Rebuilds the Hermitian spectrum from `target_mag` / `sum_phase`,
    /// inverse-transforms and applies the synthesis window.
    fn synthesize(&mut self, out: &mut [f32]) {
        let n = self.frame_len;
        let num_bins = self.magnitude.len();

        for bin in 0..num_bins {
            self.spectrum[bin] = Complex::from_polar(self.target_mag[bin], self.sum_phase[bin]);
        }
        // DC and Nyquist must be real.
        self.spectrum[0] = Complex::new(self.spectrum[0].re, 0.0);
        if num_bins > 1 {
            let nyquist = num_bins - 1;
            self.spectrum[nyquist] = Complex::new(self.spectrum[nyquist].re, 0.0);
        }
        for bin in 1..num_bins - 1 {
            self.spectrum[n - bin] = self.spectrum[bin].conj();
        }

        self.fft.inverse(&mut self.spectrum);

        let norm = 1.0 / n as f32;
        for ((o, c), &w) in out.iter_mut().zip(self.spectrum.iter()).zip(self.window.iter()) {
            *o = c.re * norm * w;
        }
    }

    /// Clears phase history and the transient detector.
    pub fn reset(&mut self) {
        self.last_phase.iter_mut().for_each(|p| *p = 0.0);
        self.sum_phase.iter_mut().for_each(|p| *p = 0.0);
        self.transient.reset();
        self.report = FrameReport::default();
    }
}

impl std::fmt::Debug for PhaseVocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseVocoder")
            .field("frame_len", &self.frame_len)
            .field("hop", &self.hop)
            .field("report", &self.report)
            .finish()
    }
}
