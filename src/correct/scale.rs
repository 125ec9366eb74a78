//! Pitch-class masks and MIDI/Hz conversion.

use crate::core::types::ScaleType;
use crate::error::VocalError;

/// Note names by pitch class, sharps only.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Distances below this many semitones count as a tie.
const TIE_EPSILON: f64 = 1e-5;

/// `69 + 12 * log2(hz / 440)`.
#[inline]
pub fn hz_to_midi(hz: f64) -> f64 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// `440 * 2^((midi - 69) / 12)`.
#[inline]
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2f64.powf((midi - 69.0) / 12.0)
}

/// Parses a root key given as `0..=11` or a note name (`C`, `F#`, `Bb`).
pub fn parse_key(s: &str) -> Result<u8, VocalError> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<u8>() {
        if n < 12 {
            return Ok(n);
        }
    }
    let mut chars = trimmed.chars();
    let letter = chars.next().map(|c| c.to_ascii_uppercase());
    let natural: i32 = match letter {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(VocalError::InvalidFormat(format!("unknown key '{}'", s))),
    };
    let accidental: i32 = match chars.as_str() {
        "" => 0,
        "#" | "s" | "sharp" => 1,
        "b" | "flat" => -1,
        _ => return Err(VocalError::InvalidFormat(format!("unknown key '{}'", s))),
    };
    Ok((natural + accidental).rem_euclid(12) as u8)
}

/// Twelve-entry active-note mask rooted at a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    mask: [bool; 12],
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(0, ScaleType::Major)
    }
}

impl Scale {
    /// Builds the mask of `scale_type` transposed to `key` (taken mod 12).
    pub fn new(key: u8, scale_type: ScaleType) -> Self {
        let mut mask = [false; 12];
        for &interval in scale_type.intervals() {
            mask[((key % 12) + interval) as usize % 12] = true;
        }
        Self { mask }
    }

    /// Wraps a custom mask; `None` if no note is active.
    pub fn from_mask(mask: [bool; 12]) -> Option<Self> {
        if mask.iter().any(|&on| on) {
            Some(Self { mask })
        } else {
            None
        }
    }

    /// The active-note mask, indexed by pitch class (0 = C).
    #[inline]
    pub fn mask(&self) -> [bool; 12] {
        self.mask
    }

    /// Whether the pitch class of `note` is active.
    #[inline]
    pub fn contains(&self, note: i32) -> bool {
        self.mask[note.rem_euclid(12) as usize]
    }

    /// Nearest active note to a (fractional) MIDI number. Equal distances
    /// resolve upward.
    pub fn nearest_note(&self, midi: f64) -> f64 {
        let rounded = midi.round() as i32;
        let mut best = rounded;
        let mut best_dist = f64::INFINITY;
        // Outward from the rounded note, above before below.
        for step in 0..=12 {
            for candidate in [rounded + step, rounded - step] {
                if !self.contains(candidate) {
                    continue;
                }
                let dist = (candidate as f64 - midi).abs();
                let better = dist < best_dist - TIE_EPSILON
                    || ((dist - best_dist).abs() <= TIE_EPSILON && candidate > best);
                if better {
                    best = candidate;
                    best_dist = dist;
                }
            }
            if best_dist.is_finite() && (step as f64) > best_dist + 1.0 {
                break;
            }
        }
        best as f64
    }
}
