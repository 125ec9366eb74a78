//! Scale-quantizing pitch corrector with one-pole glide.

use crate::core::types::ScaleType;
use crate::correct::scale::{hz_to_midi, midi_to_hz, Scale};

/// Maps detected frequencies onto the active scale.
#[derive(Debug, Clone)]
pub struct PitchCorrector {
    key: u8,
    scale_type: ScaleType,
    scale: Scale,
    /// True when the mask came from `set_active_notes`.
    custom_mask: bool,
    smoothed: f64,
    target: f32,
}

impl Default for PitchCorrector {
    fn default() -> Self {
        Self::new(0, ScaleType::Major)
    }
}

impl PitchCorrector {
    /// Creates a corrector for `key` (0 = C) and `scale_type`.
    pub fn new(key: u8, scale_type: ScaleType) -> Self {
        Self {
            key: key % 12,
            scale_type,
            scale: Scale::new(key, scale_type),
            custom_mask: false,
            smoothed: 0.0,
            target: 0.0,
        }
    }

    /// Root key.
    #[inline]
    pub fn key(&self) -> u8 {
        self.key
    }

    /// Named scale the mask was last built from.
    #[inline]
    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    /// Active-note mask in use.
    #[inline]
    pub fn active_notes(&self) -> [bool; 12] {
        self.scale.mask()
    }

    /// Whether a custom mask from [`set_active_notes`](Self::set_active_notes) is in use.
    #[inline]
    pub fn has_custom_notes(&self) -> bool {
        self.custom_mask
    }

    /// Frequency of the nearest scale note found by the last voiced call.
    #[inline]
    pub fn target_frequency(&self) -> f32 {
        self.target
    }

    /// Changes the root key and rebuilds the mask.
    pub fn set_key(&mut self, key: u8) {
        self.key = key % 12;
        self.rebuild();
    }

    /// Changes the scale and rebuilds the mask.
    pub fn set_scale(&mut self, scale_type: ScaleType) {
        self.scale_type = scale_type;
        self.rebuild();
    }

    /// Changes key and scale together.
    pub fn set_key_and_scale(&mut self, key: u8, scale_type: ScaleType) {
        self.key = key % 12;
        self.scale_type = scale_type;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.scale = Scale::new(self.key, self.scale_type);
        self.custom_mask = false;
    }

    /// Replaces the mask with an explicit note selection. An all-false mask
    /// is rejected and the current mask kept.
    pub fn set_active_notes(&mut self, notes: [bool; 12]) -> bool {
        match Scale::from_mask(notes) {
            Some(scale) => {
                self.scale = scale;
                self.custom_mask = true;
                true
            }
            None => {
                log::warn!("ignoring note mask with no active notes");
                false
            }
        }
    }

    /// Pulls `detected_hz` toward the nearest active note.
    ///
    /// `amount` blends from the detected pitch (0) to the scale note (1) in
    /// semitones; `speed` is the glide slowness, 0 jumping straight to the
    /// corrected value. Unvoiced input (`<= 0`) is returned unchanged.
    pub fn correct(&mut self, detected_hz: f32, amount: f32, speed: f32) -> f32 {
        if detected_hz <= 0.0 || !detected_hz.is_finite() {
            return detected_hz;
        }
        let amount = amount.clamp(0.0, 1.0) as f64;
        let speed = speed.clamp(0.0, 1.0) as f64;

        let midi = hz_to_midi(detected_hz as f64);
        let target_note = self.scale.nearest_note(midi);
        self.target = midi_to_hz(target_note) as f32;

        let corrected = midi_to_hz(midi + (target_note - midi) * amount);

        if self.smoothed <= 0.0 {
            self.smoothed = corrected;
        } else {
            let factor = 1.0 - speed;
            self.smoothed = self.smoothed * (1.0 - factor) + corrected * factor;
        }
        self.smoothed as f32
    }

    /// Forgets the glide state.
    pub fn reset(&mut self) {
        self.smoothed = 0.0;
        self.target = 0.0;
    }
}
