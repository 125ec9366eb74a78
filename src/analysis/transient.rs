//! Energy-ratio onset gate.
//!
//! Compares the RMS of each frame with the previous two. A frame is a
//! transient when its energy jumps by more than `threshold` times, the jump
//! is steeper than the one before it, and the new level arrives at once
//! instead of building up across the frame. The last test keeps fades out
//! of silence from counting as attacks.

/// Default energy ratio that marks a transient.
pub const DEFAULT_TRANSIENT_THRESHOLD: f32 = 2.5;

/// Minimum increase of the energy ratio over the previous ratio.
const MIN_ACCELERATION: f32 = 0.5;

/// Floor for RMS denominators.
const ENERGY_FLOOR: f32 = 1e-4;

/// Minimum energy of the first half of the post-onset region relative to the
/// second. A step gives about 1, a linear fade about 1/7.
const ATTACK_BALANCE: f32 = 0.5;

/// Onsets in the last `1 / MIN_JUDGED_FRACTION` of a frame are taken as
/// abrupt; too few samples follow them to tell.
const MIN_JUDGED_FRACTION: usize = 8;

/// Frame-to-frame RMS transient detector.
#[derive(Debug, Clone)]
pub struct TransientDetector {
    threshold: f32,
    prev_energy: f32,
    prev_prev_energy: f32,
    frames_seen: u32,
    strength: f32,
}

impl Default for TransientDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSIENT_THRESHOLD)
    }
}

impl TransientDetector {
    /// Creates a detector with the given energy-ratio threshold.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: if threshold.is_finite() && threshold > 0.0 {
                threshold
            } else {
                DEFAULT_TRANSIENT_THRESHOLD
            },
            prev_energy: 0.0,
            prev_prev_energy: 0.0,
            frames_seen: 0,
            strength: 0.0,
        }
    }

    /// Energy-ratio threshold.
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Strength of the last detection in `[0, 1]`; 0 when the last frame
    /// was not a transient.
    #[inline]
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Feeds one frame and reports whether it starts a transient.
    pub fn detect(&mut self, buffer: &[f32]) -> bool {
        let energy = rms(buffer);

        if self.frames_seen == 0 {
            self.frames_seen = 1;
            self.prev_energy = energy;
            self.strength = 0.0;
            return false;
        }
        self.frames_seen = self.frames_seen.saturating_add(1);

        let reference = self.prev_energy.max(ENERGY_FLOOR);
        let ratio = energy / reference;
        let prev_ratio = self.prev_energy / self.prev_prev_energy.max(ENERGY_FLOOR);
        let acceleration = ratio - prev_ratio;

        let is_transient = ratio > self.threshold
            && acceleration > MIN_ACCELERATION
            && is_abrupt(buffer, reference * self.threshold);
        self.strength = if is_transient {
            ((ratio - self.threshold) / self.threshold).clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.prev_prev_energy = self.prev_energy;
        self.prev_energy = energy;
        is_transient
    }

    /// Forgets the energy history.
    pub fn reset(&mut self) {
        self.prev_energy = 0.0;
        self.prev_prev_energy = 0.0;
        self.frames_seen = 0;
        self.strength = 0.0;
    }
}

/// Whether the level change starting at the first sample above
/// `onset_level` lands at once. The rest of the buffer is split in half; a
/// swell keeps most of its energy for the second half.
fn is_abrupt(buffer: &[f32], onset_level: f32) -> bool {
    let Some(onset) = buffer.iter().position(|x| x.abs() > onset_level) else {
        return true;
    };
    let tail = &buffer[onset..];
    if tail.len() < 2 || tail.len() * MIN_JUDGED_FRACTION < buffer.len() {
        return true;
    }
    let (early, late) = tail.split_at(tail.len() / 2);
    let early_energy: f32 = early.iter().map(|&x| x * x).sum();
    let late_energy: f32 = late.iter().map(|&x| x * x).sum();
    early_energy >= ATTACK_BALANCE * late_energy
}

/// Root-mean-square of a buffer; 0 for an empty one.
#[inline]
pub fn rms(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum: f32 = buffer.iter().map(|&x| x * x).sum();
    (sum / buffer.len() as f32).sqrt()
}
