//! Breath noise and resonance peak applied after resynthesis.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::biquad::{Biquad, BiquadCoeffs, BUTTERWORTH_Q};

/// Seed for the breath noise generator.
pub const BREATH_SEED: u64 = 12345;
/// High-pass cutoff shaping white noise into breath.
pub const BREATH_CUTOFF_HZ: f64 = 2000.0;
/// Breath mix at `breath_amount = 1`.
pub const BREATH_MIX: f32 = 0.15;

/// Amounts at or below this skip the stage.
const ACTIVE_THRESHOLD: f32 = 0.001;
/// Resonance is redesigned when its centre moves by more than this.
const FREQ_HYSTERESIS_HZ: f32 = 10.0;
/// Resonance is redesigned when its amount moves by more than this.
const AMOUNT_HYSTERESIS: f32 = 0.01;

/// Peak boost in dB at a given resonance amount: 3 dB to 12 dB.
#[inline]
pub fn resonance_gain_db(amount: f32) -> f64 {
    3.0 + 9.0 * amount.clamp(0.0, 1.0) as f64
}

/// Peak Q at a given resonance amount: 1 to 4.
#[inline]
pub fn resonance_q(amount: f32) -> f64 {
    1.0 + 3.0 * amount.clamp(0.0, 1.0) as f64
}

/// Breath and resonance stage.
#[derive(Debug, Clone)]
pub struct VoiceCharacter {
    sample_rate: u32,
    rng: StdRng,
    breath_filter: Biquad,
    resonance: Biquad,
    /// Design parameters of the current resonance coefficients.
    designed: Option<(f32, f32)>,
}

impl VoiceCharacter {
    /// Creates the stage for a sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            rng: StdRng::seed_from_u64(BREATH_SEED),
            breath_filter: Biquad::new(BiquadCoeffs::high_pass(
                BREATH_CUTOFF_HZ,
                BUTTERWORTH_Q,
                sample_rate,
            )),
            resonance: Biquad::default(),
            designed: None,
        }
    }

    /// Centre frequency and amount the resonance filter was last designed for.
    #[inline]
    pub fn resonance_design(&self) -> Option<(f32, f32)> {
        self.designed
    }

    /// Adds breath noise and applies the resonance peak in place.
    pub fn process(
        &mut self,
        buffer: &mut [f32],
        breath_amount: f32,
        resonance_amount: f32,
        resonance_freq_hz: f32,
    ) {
        if breath_amount > ACTIVE_THRESHOLD {
            let mix = breath_amount.min(1.0) * BREATH_MIX;
            for sample in buffer.iter_mut() {
                let noise: f32 = self.rng.gen_range(-1.0..1.0);
                *sample += self.breath_filter.process_sample(noise) * mix;
            }
        }

        if resonance_amount > ACTIVE_THRESHOLD {
            self.update_resonance(resonance_freq_hz, resonance_amount);
            self.resonance.process(buffer);
        }
    }

    fn update_resonance(&mut self, freq: f32, amount: f32) {
        let stale = match self.designed {
            None => true,
            Some((f, a)) => {
                (freq - f).abs() > FREQ_HYSTERESIS_HZ || (amount - a).abs() > AMOUNT_HYSTERESIS
            }
        };
        if stale {
            self.resonance.set_coeffs(BiquadCoeffs::peaking(
                freq as f64,
                resonance_q(amount),
                resonance_gain_db(amount),
                self.sample_rate,
            ));
            self.designed = Some((freq, amount));
        }
    }

    /// Clears filter history and reseeds the noise source.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(BREATH_SEED);
        self.breath_filter.reset();
        self.resonance.reset();
    }
}
