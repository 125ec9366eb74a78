//! YIN fundamental-frequency estimation.
//!
//! Works on the first `2 * max_lag` samples of whatever it is given and keeps
//! its difference buffer between calls, so detection never allocates.

/// Default absolute threshold on the normalized difference.
pub const DEFAULT_YIN_THRESHOLD: f32 = 0.10;

/// Smallest lag the threshold search considers.
const MIN_LAG: usize = 2;

/// YIN pitch detector.
#[derive(Debug, Clone)]
pub struct PitchDetector {
    sample_rate: u32,
    threshold: f32,
    /// d(tau), then d'(tau) in place.
    yin: Vec<f32>,
}

impl PitchDetector {
    /// Creates a detector for windows of up to `max_window` samples.
    pub fn new(sample_rate: u32, max_window: usize) -> Self {
        Self {
            sample_rate,
            threshold: DEFAULT_YIN_THRESHOLD,
            yin: vec![0.0; (max_window / 2).max(1)],
        }
    }

    /// Set the absolute threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Sample rate used to convert lags to Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Longest window the detector examines.
    #[inline]
    pub fn max_window(&self) -> usize {
        self.yin.len() * 2
    }

    /// Estimates the fundamental of `buffer` in Hz; 0 when unvoiced.
    pub fn detect(&mut self, buffer: &[f32]) -> f32 {
        let window = buffer.len().min(self.max_window());
        let half = window / 2;
        if half <= MIN_LAG || self.sample_rate == 0 {
            return 0.0;
        }

        self.difference(&buffer[..window], half);
        self.cumulative_mean_normalize(half);

        match self.absolute_threshold(half) {
            Some(tau) => {
                let lag = self.parabolic_interpolation(tau, half);
                if lag > 0.0 && lag.is_finite() {
                    self.sample_rate as f32 / lag
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    /// d(tau) = sum over the first half of (x[i] - x[i + tau])^2.
    fn difference(&mut self, buffer: &[f32], half: usize) {
        let head = &buffer[..half];
        for (tau, d) in self.yin[..half].iter_mut().enumerate() {
            let lagged = &buffer[tau..tau + half];
            *d = head
                .iter()
                .zip(lagged.iter())
                .map(|(&a, &b)| {
                    let delta = a - b;
                    delta * delta
                })
                .sum();
        }
    }

    /// d'(tau) = d(tau) * tau / sum_{1..=tau} d(j), with d'(0) = 1. A zero
    /// running sum marks the lag as non-matching.
    fn cumulative_mean_normalize(&mut self, half: usize) {
        self.yin[0] = 1.0;
        let mut running = 0.0f32;
        for tau in 1..half {
            running += self.yin[tau];
            if running <= 0.0 {
                self.yin[tau] = 1.0;
            } else {
                self.yin[tau] *= tau as f32 / running;
            }
        }
    }

    /// First lag under the threshold, walked forward to its local minimum.
    fn absolute_threshold(&self, half: usize) -> Option<usize> {
        let yin = &self.yin[..half];
        let mut tau = (MIN_LAG..half).find(|&t| yin[t] < self.threshold)?;
        while tau + 1 < half && yin[tau + 1] < yin[tau] {
            tau += 1;
        }
        Some(tau)
    }

    fn parabolic_interpolation(&self, tau: usize, half: usize) -> f32 {
        if tau < 1 || tau + 1 >= half {
            return tau as f32;
        }
        let s0 = self.yin[tau - 1];
        let s1 = self.yin[tau];
        let s2 = self.yin[tau + 1];
        let denom = 2.0 * (2.0 * s1 - s2 - s0);
        if denom.abs() < 1e-12 {
            return tau as f32;
        }
        tau as f32 + (s2 - s0) / denom
    }
}
