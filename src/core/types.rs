use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::fft::MIN_FRAME_LEN;
use crate::error::VocalError;

/// Lowest pitch or formant ratio the shifter will apply.
pub const MIN_SHIFT_RATIO: f32 = 0.25;
/// Highest pitch or formant ratio the shifter will apply.
pub const MAX_SHIFT_RATIO: f32 = 4.0;

/// Default resonance peak centre in Hz.
pub const DEFAULT_RESONANCE_FREQ_HZ: f32 = 2500.0;
const MIN_RESONANCE_FREQ_HZ: f32 = 200.0;
const MAX_RESONANCE_FREQ_HZ: f32 = 8000.0;

/// Named interval sets the pitch corrector can quantize to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    #[default]
    Major,
    Minor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Chromatic,
}

impl ScaleType {
    /// Every scale, in the order used for numeric indices.
    pub const ALL: [ScaleType; 9] = [
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::Chromatic,
    ];

    /// Semitone offsets above the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    /// Index into [`ScaleType::ALL`].
    pub fn index(self) -> u8 {
        ScaleType::ALL
            .iter()
            .position(|&s| s == self)
            .unwrap_or(0) as u8
    }

    /// Inverse of [`index`](ScaleType::index); out-of-range values map to Major.
    pub fn from_index(index: u8) -> Self {
        ScaleType::ALL
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Snake-case name, as used in presets and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::Minor => "minor",
            ScaleType::HarmonicMinor => "harmonic_minor",
            ScaleType::MelodicMinor => "melodic_minor",
            ScaleType::Dorian => "dorian",
            ScaleType::Phrygian => "phrygian",
            ScaleType::Lydian => "lydian",
            ScaleType::Mixolydian => "mixolydian",
            ScaleType::Chromatic => "chromatic",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleType {
    type Err = VocalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        ScaleType::ALL
            .iter()
            .copied()
            .find(|scale| scale.name().replace('_', "") == normalized)
            .ok_or_else(|| VocalError::InvalidFormat(format!("unknown scale '{}'", s)))
    }
}

/// How the formant stage estimates the spectral envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStrategy {
    /// All-pole model via Levinson-Durbin; falls back to `MovingAverage`
    /// on frames the analyzer rejects.
    #[default]
    Lpc,
    /// Magnitude spectrum smoothed over a fixed bin neighbourhood.
    MovingAverage,
}

/// Engine configuration, fixed between calls to `configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,
    /// Analysis frame / FFT length (default: 2048).
    pub frame_len: usize,
    /// Hop between frames (default: 512).
    pub hop: usize,
    /// LPC model order (default: 12).
    pub lpc_order: usize,
    /// Envelope estimator for formant correction.
    pub envelope: EnvelopeStrategy,
    /// Suppress pitch shifting on frames flagged as transients (default: true).
    pub bypass_on_transient: bool,
    /// Energy ratio that marks a transient (default: 2.5).
    pub transient_threshold: f32,
    /// Keep formants in place while the pitch moves (default: false).
    pub preserve_formants: bool,
    /// tanh output saturation (default: true).
    pub soft_clip: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frame_len: 2048,
            hop: 512,
            lpc_order: 12,
            envelope: EnvelopeStrategy::Lpc,
            bypass_on_transient: true,
            transient_threshold: 2.5,
            preserve_formants: false,
            soft_clip: true,
        }
    }
}

impl EngineConfig {
    /// Default configuration at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Set the frame length.
    pub fn with_frame_len(mut self, frame_len: usize) -> Self {
        self.frame_len = frame_len;
        self
    }

    /// Set the hop.
    pub fn with_hop(mut self, hop: usize) -> Self {
        self.hop = hop;
        self
    }

    /// Set the LPC order.
    pub fn with_lpc_order(mut self, order: usize) -> Self {
        self.lpc_order = order;
        self
    }

    /// Set the envelope strategy.
    pub fn with_envelope(mut self, envelope: EnvelopeStrategy) -> Self {
        self.envelope = envelope;
        self
    }

    /// Enable or disable pitch bypass on transients.
    pub fn with_bypass_on_transient(mut self, enabled: bool) -> Self {
        self.bypass_on_transient = enabled;
        self
    }

    /// Set the transient energy-ratio threshold.
    pub fn with_transient_threshold(mut self, threshold: f32) -> Self {
        self.transient_threshold = threshold;
        self
    }

    /// Enable or disable formant preservation under pitch shift.
    pub fn with_preserve_formants(mut self, enabled: bool) -> Self {
        self.preserve_formants = enabled;
        self
    }

    /// Enable or disable tanh output saturation.
    pub fn with_soft_clip(mut self, enabled: bool) -> Self {
        self.soft_clip = enabled;
        self
    }

    /// Processing latency in samples.
    #[inline]
    pub fn latency_samples(&self) -> usize {
        self.frame_len.saturating_sub(self.hop)
    }

    /// Validate all parameters.
    pub fn validate(&self) -> Result<(), VocalError> {
        if self.sample_rate == 0 {
            return Err(VocalError::InvalidSampleRate(self.sample_rate));
        }
        if self.frame_len < MIN_FRAME_LEN || !self.frame_len.is_power_of_two() {
            return Err(VocalError::InvalidFrameLength(self.frame_len));
        }
        if self.hop == 0 || self.hop >= self.frame_len {
            return Err(VocalError::InvalidHop {
                hop: self.hop,
                frame_len: self.frame_len,
            });
        }
        if self.lpc_order == 0 || self.lpc_order >= self.frame_len {
            return Err(VocalError::InvalidLpcOrder {
                order: self.lpc_order,
                frame_len: self.frame_len,
            });
        }
        if !self.transient_threshold.is_finite() || self.transient_threshold <= 0.0 {
            return Err(VocalError::InvalidFormat(format!(
                "transient threshold must be positive, got {}",
                self.transient_threshold
            )));
        }
        Ok(())
    }
}

/// Per-block control values, read once at the top of each callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSnapshot {
    /// Blend toward the nearest scale note, 0..=1 (default: 0.5).
    pub correction_amount: f32,
    /// Glide slowness of the correction, 0 = instant (default: 0.2).
    pub correction_speed: f32,
    /// Transposition in semitones, -24..=24 (default: 0).
    pub pitch_shift_semitones: f32,
    /// Formant shift in semitones, -12..=12 (default: 0).
    pub formant_shift_semitones: f32,
    /// Breath noise amount, 0..=1 (default: 0).
    pub breath_amount: f32,
    /// Resonance peak amount, 0..=1 (default: 0.5).
    pub resonance_amount: f32,
    /// Resonance peak centre, 200..=8000 Hz (default: 2500).
    pub resonance_freq_hz: f32,
    /// Root key, 0 = C .. 11 = B (default: 0).
    pub key: u8,
    /// Scale (default: Major).
    pub scale: ScaleType,
    /// Dry/converted mix for the offline converter, 0..=1 (default: 0).
    pub ai_blend: f32,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            correction_amount: 0.5,
            correction_speed: 0.2,
            pitch_shift_semitones: 0.0,
            formant_shift_semitones: 0.0,
            breath_amount: 0.0,
            resonance_amount: 0.5,
            resonance_freq_hz: DEFAULT_RESONANCE_FREQ_HZ,
            key: 0,
            scale: ScaleType::Major,
            ai_blend: 0.0,
        }
    }
}

#[inline]
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl ParamSnapshot {
    /// Clamps every field into its documented range; non-finite values fall
    /// back to the defaults.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            correction_amount: clamp_or(self.correction_amount, 0.0, 1.0, d.correction_amount),
            correction_speed: clamp_or(self.correction_speed, 0.0, 1.0, d.correction_speed),
            pitch_shift_semitones: clamp_or(
                self.pitch_shift_semitones,
                -24.0,
                24.0,
                d.pitch_shift_semitones,
            ),
            formant_shift_semitones: clamp_or(
                self.formant_shift_semitones,
                -12.0,
                12.0,
                d.formant_shift_semitones,
            ),
            breath_amount: clamp_or(self.breath_amount, 0.0, 1.0, d.breath_amount),
            resonance_amount: clamp_or(self.resonance_amount, 0.0, 1.0, d.resonance_amount),
            resonance_freq_hz: clamp_or(
                self.resonance_freq_hz,
                MIN_RESONANCE_FREQ_HZ,
                MAX_RESONANCE_FREQ_HZ,
                d.resonance_freq_hz,
            ),
            key: self.key % 12,
            scale: self.scale,
            ai_blend: clamp_or(self.ai_blend, 0.0, 1.0, d.ai_blend),
        }
    }

    /// Frequency ratio of the transposition, clamped to the shifter range.
    #[inline]
    pub fn pitch_shift_ratio(&self) -> f32 {
        semitones_to_ratio(self.pitch_shift_semitones)
    }

    /// Frequency ratio of the formant shift, clamped to the shifter range.
    #[inline]
    pub fn formant_ratio(&self) -> f32 {
        semitones_to_ratio(self.formant_shift_semitones)
    }
}

/// `2^(st/12)` clamped to `[MIN_SHIFT_RATIO, MAX_SHIFT_RATIO]`.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    clamp_ratio(2.0f32.powf(semitones / 12.0))
}

/// Clamps a ratio to the shifter range; non-finite ratios become 1.
#[inline]
pub fn clamp_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() {
        ratio.clamp(MIN_SHIFT_RATIO, MAX_SHIFT_RATIO)
    } else {
        1.0
    }
}
