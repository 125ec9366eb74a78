//! Scale quantization.

pub mod corrector;
pub mod scale;

pub use corrector::PitchCorrector;
pub use scale::{hz_to_midi, midi_to_hz, parse_key, Scale, NOTE_NAMES};
