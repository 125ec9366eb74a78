//! Feature extraction plus conversion with passthrough fallbacks.

use crate::analysis::features::FeatureExtractor;
use crate::error::VocalError;
use crate::offline::collaborator::{Conversion, ConversionRequest, VoiceConverter};

/// How an offline job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineStatus {
    /// The converter returned `samples` samples (before length matching).
    Converted { samples: usize },
    /// No model was loaded; the input passed through.
    NoModel,
    /// The input was shorter than one analysis frame; it passed through.
    TooShort,
    /// The converter ran but produced nothing usable; the input passed
    /// through.
    InferenceFailed,
}

impl OfflineStatus {
    pub fn is_converted(&self) -> bool {
        matches!(self, OfflineStatus::Converted { .. })
    }

    /// Human-readable summary.
    pub fn message(&self) -> String {
        match self {
            OfflineStatus::Converted { samples } => {
                format!("conversion complete: {} samples generated", samples)
            }
            OfflineStatus::NoModel => "no model loaded, audio passed through".to_string(),
            OfflineStatus::TooShort => "input too short, audio passed through".to_string(),
            OfflineStatus::InferenceFailed => {
                "conversion failed, audio passed through".to_string()
            }
        }
    }
}

/// Result audio plus how it was obtained. `audio` always has the input's
/// length.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineOutcome {
    pub audio: Vec<f32>,
    pub status: OfflineStatus,
}

impl OfflineOutcome {
    fn passthrough(input: &[f32], status: OfflineStatus) -> Self {
        Self {
            audio: input.to_vec(),
            status,
        }
    }
}

/// Runs the offline pipeline: features, then the converter.
pub struct OfflineVoiceProcessor {
    sample_rate: u32,
    extractor: FeatureExtractor,
    converter: Box<dyn VoiceConverter>,
    ai_blend: f32,
}

impl std::fmt::Debug for OfflineVoiceProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineVoiceProcessor")
            .field("sample_rate", &self.sample_rate)
            .field("converter", &self.converter.describe())
            .field("ai_blend", &self.ai_blend)
            .finish()
    }
}

impl OfflineVoiceProcessor {
    pub fn new(sample_rate: u32, converter: Box<dyn VoiceConverter>) -> Self {
        Self {
            sample_rate,
            extractor: FeatureExtractor::new(sample_rate),
            converter,
            ai_blend: 0.0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_loaded(&self) -> bool {
        self.converter.is_loaded()
    }

    /// Blend forwarded to the converter, clamped to 0..=1.
    pub fn set_ai_blend(&mut self, blend: f32) {
        self.ai_blend = if blend.is_finite() {
            blend.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Swaps in a different converter.
    pub fn set_converter(&mut self, converter: Box<dyn VoiceConverter>) {
        log::info!("offline converter set: {}", converter.describe());
        self.converter = converter;
    }

    /// Converts `input`. Never fails: every problem degrades to returning the
    /// input unchanged, with the reason in the status.
    pub fn process(&mut self, input: &[f32]) -> OfflineOutcome {
        if !self.converter.is_loaded() {
            log::warn!("offline conversion skipped: no model loaded");
            return OfflineOutcome::passthrough(input, OfflineStatus::NoModel);
        }

        let features = match self.extractor.extract(input) {
            Ok(features) => features,
            Err(VocalError::InputTooShort { provided, minimum }) => {
                log::warn!(
                    "offline conversion skipped: {} samples, need at least {}",
                    provided,
                    minimum
                );
                return OfflineOutcome::passthrough(input, OfflineStatus::TooShort);
            }
            Err(e) => {
                log::warn!("offline feature extraction failed: {}", e);
                return OfflineOutcome::passthrough(input, OfflineStatus::InferenceFailed);
            }
        };
        log::debug!(
            "extracted {} frames x {} mel bands",
            features.frame_count,
            features.band_count
        );

        let request = ConversionRequest {
            features: &features,
            sample_rate: self.sample_rate,
            input_len: input.len(),
            ai_blend: self.ai_blend,
        };
        match self.converter.convert(&request) {
            Conversion::Waveform(mut audio) if !audio.is_empty() => {
                let samples = audio.len();
                audio.resize(input.len(), 0.0);
                log::info!("offline conversion complete: {} samples generated", samples);
                OfflineOutcome {
                    audio,
                    status: OfflineStatus::Converted { samples },
                }
            }
            _ => {
                log::warn!("offline converter returned no audio, passing input through");
                OfflineOutcome::passthrough(input, OfflineStatus::InferenceFailed)
            }
        }
    }
}
