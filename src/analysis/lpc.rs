//! Linear prediction (all-pole) model of a frame's spectral envelope.
//!
//! Autocorrelation plus the Levinson-Durbin recursion, evaluated as
//! `1 / |A(e^jw)|`. Every buffer is sized at construction.

use std::f64::consts::PI;

/// Floor on `|A(e^jw)|` when evaluating the envelope.
const MIN_DENOMINATOR: f64 = 1e-9;

/// LPC analyzer with a fixed model order.
#[derive(Debug, Clone)]
pub struct LpcAnalyzer {
    order: usize,
    sample_rate: u32,
    autocorr: Vec<f64>,
    a: Vec<f64>,
    a_prev: Vec<f64>,
    /// `[1, -a1, ..., -ap]`, the inverse filter A(z).
    coeffs: Vec<f32>,
    error: f32,
}

impl LpcAnalyzer {
    /// Creates an analyzer of the given order. Order 0 is bumped to 1.
    pub fn new(order: usize, sample_rate: u32) -> Self {
        let order = order.max(1);
        let mut coeffs = vec![0.0; order + 1];
        coeffs[0] = 1.0;
        Self {
            order,
            sample_rate,
            autocorr: vec![0.0; order + 1],
            a: vec![0.0; order + 1],
            a_prev: vec![0.0; order + 1],
            coeffs,
            error: 0.0,
        }
    }

    /// Model order.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Sample rate used by [`spectral_envelope`](Self::spectral_envelope).
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Inverse-filter coefficients `[1, -a1, ..., -ap]` from the last analysis.
    #[inline]
    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }

    /// Residual prediction error from the last analysis.
    #[inline]
    pub fn prediction_error(&self) -> f32 {
        self.error
    }

    /// Fits the model to `buffer`. Returns false, leaving the previous model
    /// untouched, when fewer than `order + 1` samples are given.
    ///
    /// A silent buffer yields the identity model (all predictor
    /// coefficients zero) and succeeds.
    pub fn analyze(&mut self, buffer: &[f32]) -> bool {
        if buffer.len() < self.order + 1 {
            return false;
        }
        self.autocorrelate(buffer);
        self.levinson_durbin();
        true
    }

    fn autocorrelate(&mut self, buffer: &[f32]) {
        for (lag, r) in self.autocorr.iter_mut().enumerate() {
            *r = buffer
                .iter()
                .zip(buffer[lag..].iter())
                .map(|(&x, &y)| x as f64 * y as f64)
                .sum();
        }
    }

    fn levinson_durbin(&mut self) {
        self.a.iter_mut().for_each(|v| *v = 0.0);
        self.coeffs.iter_mut().for_each(|v| *v = 0.0);
        self.coeffs[0] = 1.0;

        let r = &self.autocorr;
        if r[0] <= 0.0 || !r[0].is_finite() {
            self.error = 0.0;
            return;
        }

        let mut error = r[0];
        for i in 1..=self.order {
            let mut lambda = r[i];
            for j in 1..i {
                lambda -= self.a[j] * r[i - j];
            }
            let k = lambda / error;

            self.a_prev[1..i].copy_from_slice(&self.a[1..i]);
            self.a[i] = k;
            for j in 1..i {
                self.a[j] = self.a_prev[j] - k * self.a_prev[i - j];
            }

            error *= 1.0 - k * k;
            // Numerically singular; keep the model fitted so far.
            if error <= 0.0 {
                error = 0.0;
                break;
            }
        }

        for (c, &a) in self.coeffs[1..].iter_mut().zip(self.a[1..].iter()) {
            *c = -a as f32;
        }
        self.error = error as f32;
    }

    /// Evaluates `1 / |A(e^jw)|` at each frequency (Hz) into `out`.
    pub fn spectral_envelope(&self, frequencies: &[f32], out: &mut [f32]) {
        let sr = self.sample_rate.max(1) as f64;
        for (&freq, env) in frequencies.iter().zip(out.iter_mut()) {
            let omega = 2.0 * PI * freq as f64 / sr;
            let (sin_w, cos_w) = omega.sin_cos();
            // z^-1 = e^-jw; walk its powers by repeated rotation.
            let (mut zr, mut zi) = (1.0f64, 0.0f64);
            let (mut re, mut im) = (0.0f64, 0.0f64);
            for &c in &self.coeffs {
                re += c as f64 * zr;
                im += c as f64 * zi;
                let next_r = zr * cos_w + zi * sin_w;
                let next_i = zi * cos_w - zr * sin_w;
                zr = next_r;
                zi = next_i;
            }
            let mag = (re * re + im * im).sqrt().max(MIN_DENOMINATOR);
            *env = (1.0 / mag) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_fails() {
        let mut lpc = LpcAnalyzer::new(12, 44100);
        assert!(!lpc.analyze(&[0.1; 12]));
        assert!(lpc.analyze(&[0.1; 13]));
    }

    #[test]
    fn test_silence_gives_identity_model() {
        let mut lpc = LpcAnalyzer::new(8, 44100);
        assert!(lpc.analyze(&[0.0; 256]));
        assert_eq!(lpc.coefficients()[0], 1.0);
        assert!(lpc.coefficients()[1..].iter().all(|&c| c == 0.0));
        assert_eq!(lpc.prediction_error(), 0.0);

        let mut env = [0.0f32; 3];
        lpc.spectral_envelope(&[100.0, 5000.0, 20000.0], &mut env);
        for &e in &env {
            assert!((e - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_first_order_recovers_ar1() {
        // x[n] = 0.9 x[n-1] + impulse response; r1/r0 = 0.9
        let signal: Vec<f32> = (0..4096).map(|i| 0.9f32.powi(i)).collect();
        let mut lpc = LpcAnalyzer::new(1, 44100);
        assert!(lpc.analyze(&signal));
        let c = lpc.coefficients();
        assert!((c[1] + 0.9).abs() < 0.01, "a1 = {}", -c[1]);
    }

    #[test]
    fn test_envelope_of_lowpass_model_falls() {
        let signal: Vec<f32> = (0..2048).map(|i| 0.95f32.powi(i % 64)).collect();
        let mut lpc = LpcAnalyzer::new(4, 44100);
        assert!(lpc.analyze(&signal));
        let mut env = [0.0f32; 2];
        lpc.spectral_envelope(&[50.0, 15000.0], &mut env);
        assert!(env[0] > env[1]);
    }
}
