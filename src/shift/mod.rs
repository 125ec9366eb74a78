//! Frequency-domain pitch and formant shifting.

pub mod envelope;
pub mod phase_vocoder;

pub use envelope::FormantEnvelope;
pub use phase_vocoder::{FrameReport, PhaseVocoder};
