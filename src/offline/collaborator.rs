//! Boundary to an external voice-conversion model.
//!
//! The crate only prepares features and consumes audio; what runs behind
//! [`VoiceConverter`] (model format, runtime, device) is opaque.

use crate::analysis::features::FeatureSet;

/// Input handed to a converter.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub features: &'a FeatureSet,
    pub sample_rate: u32,
    /// Length of the source audio; the converter should aim to return this
    /// many samples.
    pub input_len: usize,
    /// Dry/converted mix requested by the user, 0..=1.
    pub ai_blend: f32,
}

/// What a converter produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Waveform(Vec<f32>),
    /// The model could not run; the caller falls back to the source audio.
    Unavailable,
}

/// An offline conversion model.
pub trait VoiceConverter: Send {
    /// Whether a model is loaded and ready.
    fn is_loaded(&self) -> bool;

    /// Runs the model. Must not panic on odd input; return
    /// [`Conversion::Unavailable`] instead.
    fn convert(&mut self, request: &ConversionRequest<'_>) -> Conversion;

    /// Short description for logs and status lines.
    fn describe(&self) -> String {
        if self.is_loaded() {
            "voice converter".to_string()
        } else {
            "no model loaded".to_string()
        }
    }
}

/// Converter used when no model is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

impl VoiceConverter for NoModel {
    fn is_loaded(&self) -> bool {
        false
    }

    fn convert(&mut self, _request: &ConversionRequest<'_>) -> Conversion {
        Conversion::Unavailable
    }
}
