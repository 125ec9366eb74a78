//! Second-order IIR sections (RBJ cookbook designs).
//!
//! Coefficients and history are kept apart so a filter can be redesigned
//! mid-stream without clearing its delay line.

use std::f64::consts::PI;

/// Butterworth Q factor (1/sqrt(2)) for maximally-flat magnitude response.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Highest design frequency as a fraction of the sample rate.
const MAX_DESIGN_FRACTION: f64 = 0.49;

/// Biquad coefficients, pre-normalized by a0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Pass-through section.
    pub const IDENTITY: BiquadCoeffs = BiquadCoeffs {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn omega(freq: f64, sample_rate: u32) -> f64 {
        let sr = sample_rate.max(1) as f64;
        let freq = freq.clamp(1.0, sr * MAX_DESIGN_FRACTION);
        2.0 * PI * freq / sr
    }

    /// 2nd-order high-pass at `freq` with quality `q`.
    pub fn high_pass(freq: f64, q: f64, sample_rate: u32) -> Self {
        let w0 = Self::omega(freq, sample_rate);
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q.max(1e-3));

        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos_w0) / 2.0 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Peaking EQ centred on `freq` with quality `q` and `gain_db` boost.
    pub fn peaking(freq: f64, q: f64, gain_db: f64, sample_rate: u32) -> Self {
        let w0 = Self::omega(freq, sample_rate);
        let cos_w0 = w0.cos();
        let a = 10f64.powf(gain_db / 40.0);
        let alpha = w0.sin() / (2.0 * q.max(1e-3));

        let a0 = 1.0 + alpha / a;
        Self {
            b0: (1.0 + alpha * a) / a0,
            b1: -2.0 * cos_w0 / a0,
            b2: (1.0 - alpha * a) / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha / a) / a0,
        }
    }

    /// Magnitude response at `freq`.
    pub fn magnitude_at(&self, freq: f64, sample_rate: u32) -> f64 {
        let w = 2.0 * PI * freq / sample_rate.max(1) as f64;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im).max(1e-30))
            .sqrt()
    }
}

/// One biquad section with its Direct Form I delay line.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new(BiquadCoeffs::IDENTITY)
    }
}

impl Biquad {
    /// Creates a section with zeroed history.
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Current coefficients.
    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Replaces the coefficients, keeping the delay line.
    #[inline]
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    /// Processes a single sample:
    /// `y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]`.
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let x = input as f64;
        let c = &self.coeffs;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        // Flush denormals out of the feedback path.
        self.y1 = if y.abs() < 1e-30 { 0.0 } else { y };
        y as f32
    }

    /// Filters a buffer in place.
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Resets all delay line state to zero.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
