//! Window functions for spectral analysis.
//!
//! The phase vocoder uses the periodic Hann window so that its squared
//! overlap sums stay flat at the usual 4x overlap; the offline mel front end
//! uses the symmetric form.

use std::f64::consts::PI;

/// Window function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    /// Symmetric Hann, zero at both ends.
    Hann,
    /// Periodic Hann (DFT-even), zero only at the first sample.
    PeriodicHann,
}

/// Generates a window function of the specified type and size.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f32> {
    match window_type {
        WindowType::Hann => hann(size, size.saturating_sub(1)),
        WindowType::PeriodicHann => hann(size, size),
    }
}

/// Returns `Some(trivial_window)` for degenerate sizes (0 or 1), or `None`
/// to indicate the caller should compute the full window.
#[inline]
fn trivial_window(size: usize) -> Option<Vec<f32>> {
    match size {
        0 => Some(vec![]),
        1 => Some(vec![1.0]),
        _ => None,
    }
}

#[inline]
fn hann(size: usize, period: usize) -> Vec<f32> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    let n = period as f64;
    (0..size)
        .map(|i| {
            let x = (2.0 * PI * i as f64) / n;
            (0.5 * (1.0 - x.cos())) as f32
        })
        .collect()
}

/// Squares every coefficient, giving the combined analysis x synthesis
/// weight of a window applied on both sides of a transform.
pub fn squared_window(window: &[f32]) -> Vec<f32> {
    window.iter().map(|&w| w * w).collect()
}

/// Applies a window function to a slice in-place.
#[inline]
pub fn apply_window(data: &mut [f32], window: &[f32]) {
    for (sample, &w) in data.iter_mut().zip(window.iter()) {
        *sample *= w;
    }
}

/// Multiplies `input` by `window` into `out` without allocating.
#[inline]
pub fn apply_window_into(input: &[f32], window: &[f32], out: &mut [f32]) {
    for ((o, &x), &w) in out.iter_mut().zip(input.iter()).zip(window.iter()) {
        *o = x * w;
    }
}
