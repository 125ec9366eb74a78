//! Spectral envelope estimation and formant warping.
//!
//! The envelope of the unshifted frame is estimated either from an LPC model
//! or by smoothing the magnitude spectrum, then warped along frequency by the
//! formant ratio. Shifted magnitudes are scaled by warped / reference.

use crate::analysis::lpc::LpcAnalyzer;
use crate::core::types::EnvelopeStrategy;

/// Half-width in bins of the moving-average smoother.
pub const SMOOTHING_HALF_WIDTH: usize = 20;

/// Largest boost or cut the envelope correction may apply to one bin.
const MAX_ENVELOPE_GAIN: f32 = 16.0;

/// Reference envelope values below this leave the bin untouched.
const ENVELOPE_FLOOR: f32 = 1e-9;

/// Envelope estimator plus its per-bin buffers.
#[derive(Debug, Clone)]
pub struct FormantEnvelope {
    strategy: EnvelopeStrategy,
    lpc: LpcAnalyzer,
    /// Centre frequency of every bin, in Hz.
    bin_freqs: Vec<f32>,
    envelope: Vec<f32>,
    /// Strategy that produced the current envelope.
    last_used: EnvelopeStrategy,
}

impl FormantEnvelope {
    /// Creates an estimator for a `frame_len`-point spectrum.
    pub fn new(strategy: EnvelopeStrategy, lpc_order: usize, sample_rate: u32, frame_len: usize) -> Self {
        let num_bins = frame_len / 2 + 1;
        let bin_hz = sample_rate as f32 / frame_len.max(1) as f32;
        Self {
            strategy,
            lpc: LpcAnalyzer::new(lpc_order, sample_rate),
            bin_freqs: (0..num_bins).map(|k| k as f32 * bin_hz).collect(),
            envelope: vec![1.0; num_bins],
            last_used: strategy,
        }
    }

    /// Configured strategy.
    #[inline]
    pub fn strategy(&self) -> EnvelopeStrategy {
        self.strategy
    }

    /// Strategy that produced the current envelope; differs from
    /// [`strategy`](Self::strategy) when LPC analysis was rejected.
    #[inline]
    pub fn last_used(&self) -> EnvelopeStrategy {
        self.last_used
    }

    /// Current envelope, one value per bin.
    #[inline]
    pub fn envelope(&self) -> &[f32] {
        &self.envelope
    }

    /// Estimates the envelope of one frame. `windowed` is the time-domain
    /// analysis frame, `magnitudes` its spectrum.
    pub fn estimate(&mut self, windowed: &[f32], magnitudes: &[f32]) {
        self.last_used = match self.strategy {
            EnvelopeStrategy::Lpc if self.lpc.analyze(windowed) => {
                self.lpc.spectral_envelope(&self.bin_freqs, &mut self.envelope);
                EnvelopeStrategy::Lpc
            }
            _ => {
                moving_average(magnitudes, SMOOTHING_HALF_WIDTH, &mut self.envelope);
                EnvelopeStrategy::MovingAverage
            }
        };
    }

    /// Scales `magnitudes` so their envelope moves by `formant_ratio`.
    ///
    /// With `displaced_by = Some(pitch_ratio)` the reference is the envelope
    /// as the pitch shift displaced it, so formants stay at their original
    /// frequencies apart from `formant_ratio`.
    pub fn warp(&self, magnitudes: &mut [f32], formant_ratio: f32, displaced_by: Option<f32>) {
        let formant_ratio = formant_ratio.max(f32::EPSILON);
        for (k, mag) in magnitudes.iter_mut().enumerate() {
            let warped = interpolate(&self.envelope, k as f32 / formant_ratio);
            let reference = match displaced_by {
                Some(ratio) => interpolate(&self.envelope, k as f32 / ratio.max(f32::EPSILON)),
                None => self.envelope.get(k).copied().unwrap_or(0.0),
            };
            if reference > ENVELOPE_FLOOR {
                let gain = (warped / reference).clamp(1.0 / MAX_ENVELOPE_GAIN, MAX_ENVELOPE_GAIN);
                *mag *= gain;
            }
        }
    }
}

/// Linear interpolation into `values` at a fractional index, clamped to the
/// ends.
#[inline]
fn interpolate(values: &[f32], position: f32) -> f32 {
    let last = values.len().saturating_sub(1);
    if values.is_empty() {
        return 0.0;
    }
    if position <= 0.0 {
        return values[0];
    }
    let i = position.floor() as usize;
    if i >= last {
        return values[last];
    }
    let frac = position - i as f32;
    values[i] * (1.0 - frac) + values[i + 1] * frac
}

/// Mean of `input` over `[k - half, k + half]` (clipped to the ends) for every bin.
pub fn moving_average(input: &[f32], half: usize, out: &mut [f32]) {
    let n = input.len().min(out.len());
    if n == 0 {
        return;
    }
    let mut sum = 0.0f64;
    let mut lo = 0usize;
    let mut hi = 0usize; // exclusive
    for (k, o) in out.iter_mut().enumerate().take(n) {
        let want_hi = (k + half + 1).min(n);
        let want_lo = k.saturating_sub(half);
        while hi < want_hi {
            sum += input[hi] as f64;
            hi += 1;
        }
        while lo < want_lo {
            sum -= input[lo] as f64;
            lo += 1;
        }
        *o = (sum / (hi - lo) as f64) as f32;
    }
}
