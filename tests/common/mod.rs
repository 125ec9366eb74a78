#![allow(dead_code)]

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vocalshift::{ParamSnapshot, PitchDetector};

pub const SR: u32 = 44_100;

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

/// Fundamental plus decaying harmonics, roughly voice-like.
pub fn gen_harmonic(freq_hz: f32, sr: u32, n: usize, harmonics: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            (1..=harmonics)
                .map(|h| (2.0 * PI * freq_hz * h as f32 * t).sin() * 0.5 / h as f32)
                .sum()
        })
        .collect()
}

pub fn gen_noise(n: usize, amp: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-amp..amp)).collect()
}

/// `quiet` samples at `quiet_amp`, then `loud` samples at `loud_amp`, of the
/// same sine.
pub fn gen_step(freq_hz: f32, quiet: usize, quiet_amp: f32, loud: usize, loud_amp: f32) -> Vec<f32> {
    (0..quiet + loud)
        .map(|i| {
            let amp = if i < quiet { quiet_amp } else { loud_amp };
            amp * (2.0 * PI * freq_hz * i as f32 / SR as f32).sin()
        })
        .collect()
}

/// `quiet` samples at `quiet_amp`, a linear ramp to `loud_amp` over `fade`
/// samples, then `hold` samples at `loud_amp`, of the same sine.
pub fn gen_swell(
    freq_hz: f32,
    quiet: usize,
    quiet_amp: f32,
    fade: usize,
    hold: usize,
    loud_amp: f32,
) -> Vec<f32> {
    (0..quiet + fade + hold)
        .map(|i| {
            let amp = if i < quiet {
                quiet_amp
            } else if i < quiet + fade {
                quiet_amp + (loud_amp - quiet_amp) * (i - quiet) as f32 / fade as f32
            } else {
                loud_amp
            };
            amp * (2.0 * PI * freq_hz * i as f32 / SR as f32).sin()
        })
        .collect()
}

/// Two-pole resonator at `centre_hz` with pole radius `r`, driven by
/// `excitation`.
pub fn resonate(excitation: &[f32], centre_hz: f32, r: f32, sr: u32) -> Vec<f32> {
    let theta = 2.0 * std::f64::consts::PI * centre_hz as f64 / sr as f64;
    let a1 = 2.0 * r as f64 * theta.cos();
    let a2 = -(r as f64 * r as f64);
    let (mut y1, mut y2) = (0.0f64, 0.0f64);
    excitation
        .iter()
        .map(|&x| {
            let y = x as f64 + a1 * y1 + a2 * y2;
            y2 = y1;
            y1 = y;
            y as f32
        })
        .collect()
}

pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// RMS of `output[t] - input[t - delay]` over `output[start..]`, relative to
/// the RMS of the reference.
pub fn aligned_error(input: &[f32], output: &[f32], delay: usize, start: usize) -> f64 {
    let end = output.len().min(input.len() + delay);
    if end <= start || start < delay {
        return f64::INFINITY;
    }
    let mut err = 0.0f64;
    let mut reference = 0.0f64;
    for t in start..end {
        let x = input[t - delay] as f64;
        let d = output[t] as f64 - x;
        err += d * d;
        reference += x * x;
    }
    if reference == 0.0 {
        return if err == 0.0 { 0.0 } else { f64::INFINITY };
    }
    (err / reference).sqrt()
}

/// YIN estimate over `signal[start..start + len]`.
pub fn pitch_at(signal: &[f32], start: usize, len: usize) -> f32 {
    let end = (start + len).min(signal.len());
    PitchDetector::new(SR, len).detect(&signal[start..end])
}

/// Controls with every effect switched off.
pub fn neutral_params() -> ParamSnapshot {
    ParamSnapshot {
        correction_amount: 0.0,
        correction_speed: 0.0,
        pitch_shift_semitones: 0.0,
        formant_shift_semitones: 0.0,
        breath_amount: 0.0,
        resonance_amount: 0.0,
        ..ParamSnapshot::default()
    }
}

/// Splits `buf` into consecutive blocks with sizes cycling through `sizes`.
pub fn for_each_block<F>(buf: &mut [f32], sizes: &[usize], mut f: F)
where
    F: FnMut(&mut [f32]),
{
    let mut pos = 0;
    let mut idx = 0;
    while pos < buf.len() {
        let size = sizes[idx % sizes.len()].max(1);
        let end = (pos + size).min(buf.len());
        f(&mut buf[pos..end]);
        pos = end;
        idx += 1;
    }
}
