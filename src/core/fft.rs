//! FFT plans and constants shared across the crate.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Zero-valued complex number, used for FFT buffer initialization.
pub const COMPLEX_ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Overlap-add gain below which the accumulator is emitted unnormalized.
pub const WINDOW_SUM_EPSILON: f32 = 1e-6;

/// Smallest supported analysis frame.
pub const MIN_FRAME_LEN: usize = 64;

/// Forward and inverse plans of one size plus their shared scratch.
///
/// Planning happens once in [`SpectralFft::new`]; both transforms run in
/// place with caller-owned scratch so they never allocate afterwards.
pub struct SpectralFft {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectralFft {
    /// Plans forward and inverse transforms of `size` points.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            size,
            forward,
            inverse,
            scratch: vec![COMPLEX_ZERO; scratch_len],
        }
    }

    /// Transform length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of non-negative frequency bins (`size / 2 + 1`).
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Unnormalized forward transform in place. `buffer` must hold `size` points.
    #[inline]
    pub fn forward(&mut self, buffer: &mut [Complex<f32>]) {
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Unnormalized inverse transform in place. `buffer` must hold `size` points.
    #[inline]
    pub fn inverse(&mut self, buffer: &mut [Complex<f32>]) {
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
    }
}

impl std::fmt::Debug for SpectralFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralFft").field("size", &self.size).finish()
    }
}

/// Wraps a phase into `[-PI, PI]`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    use std::f32::consts::PI;
    let two_pi = 2.0 * PI;
    phase - two_pi * ((phase + PI) / two_pi).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_forward_inverse_scales_by_size() {
        let mut fft = SpectralFft::new(64);
        let original: Vec<Complex<f32>> = (0..64)
            .map(|i| Complex::new((i as f32 * 0.3).sin(), 0.0))
            .collect();
        let mut buf = original.clone();
        fft.forward(&mut buf);
        fft.inverse(&mut buf);
        for (a, b) in buf.iter().zip(original.iter()) {
            assert!((a.re / 64.0 - b.re).abs() < 1e-5);
        }
        assert_eq!(fft.num_bins(), 33);
    }

    #[test]
    fn test_wrap_phase_range() {
        for &p in &[0.0f32, 3.5, -3.5, 10.0 * PI + 0.1, -7.0 * PI] {
            let w = wrap_phase(p);
            assert!((-PI - 1e-5..=PI + 1e-5).contains(&w), "wrap({}) = {}", p, w);
            let turns = (p - w) / (2.0 * PI);
            assert!((turns - turns.round()).abs() < 1e-4);
        }
    }
}
