//! Lock-free control store shared between a UI/control thread and the
//! audio callback.
//!
//! Each control is an independent atomic; a callback reads them all once
//! into a [`ParamSnapshot`]. Reads across controls are not mutually
//! consistent, which is acceptable at block granularity.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::core::types::{ParamSnapshot, ScaleType};

/// An `f32` stored as its bit pattern.
#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Every engine control as an atomic scalar.
#[derive(Debug)]
pub struct EngineControls {
    correction_amount: AtomicF32,
    correction_speed: AtomicF32,
    pitch_shift_semitones: AtomicF32,
    formant_shift_semitones: AtomicF32,
    breath_amount: AtomicF32,
    resonance_amount: AtomicF32,
    resonance_freq_hz: AtomicF32,
    key: AtomicU8,
    scale: AtomicU8,
    ai_blend: AtomicF32,
}

impl Default for EngineControls {
    fn default() -> Self {
        Self::new(&ParamSnapshot::default())
    }
}

impl EngineControls {
    /// Creates a store holding `initial`.
    pub fn new(initial: &ParamSnapshot) -> Self {
        Self {
            correction_amount: AtomicF32::new(initial.correction_amount),
            correction_speed: AtomicF32::new(initial.correction_speed),
            pitch_shift_semitones: AtomicF32::new(initial.pitch_shift_semitones),
            formant_shift_semitones: AtomicF32::new(initial.formant_shift_semitones),
            breath_amount: AtomicF32::new(initial.breath_amount),
            resonance_amount: AtomicF32::new(initial.resonance_amount),
            resonance_freq_hz: AtomicF32::new(initial.resonance_freq_hz),
            key: AtomicU8::new(initial.key % 12),
            scale: AtomicU8::new(initial.scale.index()),
            ai_blend: AtomicF32::new(initial.ai_blend),
        }
    }

    /// Reads every control once.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            correction_amount: self.correction_amount.load(),
            correction_speed: self.correction_speed.load(),
            pitch_shift_semitones: self.pitch_shift_semitones.load(),
            formant_shift_semitones: self.formant_shift_semitones.load(),
            breath_amount: self.breath_amount.load(),
            resonance_amount: self.resonance_amount.load(),
            resonance_freq_hz: self.resonance_freq_hz.load(),
            key: self.key.load(Ordering::Relaxed),
            scale: ScaleType::from_index(self.scale.load(Ordering::Relaxed)),
            ai_blend: self.ai_blend.load(),
        }
    }

    /// Writes every control from a snapshot (e.g. a loaded preset).
    pub fn store(&self, params: &ParamSnapshot) {
        self.set_correction_amount(params.correction_amount);
        self.set_correction_speed(params.correction_speed);
        self.set_pitch_shift(params.pitch_shift_semitones);
        self.set_formant_shift(params.formant_shift_semitones);
        self.set_breath(params.breath_amount);
        self.set_resonance(params.resonance_amount);
        self.set_resonance_freq(params.resonance_freq_hz);
        self.set_key(params.key);
        self.set_scale(params.scale);
        self.set_ai_blend(params.ai_blend);
    }

    pub fn set_correction_amount(&self, value: f32) {
        self.correction_amount.store(value);
    }

    pub fn set_correction_speed(&self, value: f32) {
        self.correction_speed.store(value);
    }

    pub fn set_pitch_shift(&self, semitones: f32) {
        self.pitch_shift_semitones.store(semitones);
    }

    pub fn set_formant_shift(&self, semitones: f32) {
        self.formant_shift_semitones.store(semitones);
    }

    pub fn set_breath(&self, value: f32) {
        self.breath_amount.store(value);
    }

    pub fn set_resonance(&self, value: f32) {
        self.resonance_amount.store(value);
    }

    pub fn set_resonance_freq(&self, hz: f32) {
        self.resonance_freq_hz.store(hz);
    }

    /// Root key; taken mod 12.
    pub fn set_key(&self, key: u8) {
        self.key.store(key % 12, Ordering::Relaxed);
    }

    pub fn set_scale(&self, scale: ScaleType) {
        self.scale.store(scale.index(), Ordering::Relaxed);
    }

    pub fn set_ai_blend(&self, value: f32) {
        self.ai_blend.store(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_snapshot_round_trip() {
        let params = ParamSnapshot {
            correction_amount: 0.9,
            correction_speed: 0.05,
            pitch_shift_semitones: -7.0,
            formant_shift_semitones: 3.5,
            breath_amount: 0.25,
            resonance_amount: 0.75,
            resonance_freq_hz: 1800.0,
            key: 9,
            scale: ScaleType::Phrygian,
            ai_blend: 0.4,
        };
        let controls = EngineControls::new(&params);
        assert_eq!(controls.snapshot(), params);

        controls.store(&ParamSnapshot::default());
        assert_eq!(controls.snapshot(), ParamSnapshot::default());
    }

    #[test]
    fn test_writes_from_another_thread() {
        let controls = Arc::new(EngineControls::default());
        let writer = Arc::clone(&controls);
        thread::spawn(move || {
            writer.set_pitch_shift(12.0);
            writer.set_key(14);
            writer.set_scale(ScaleType::Lydian);
        })
        .join()
        .unwrap();
        let snap = controls.snapshot();
        assert_eq!(snap.pitch_shift_semitones, 12.0);
        assert_eq!(snap.key, 2);
        assert_eq!(snap.scale, ScaleType::Lydian);
    }
}
