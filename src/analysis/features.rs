//! F0 curve plus mel spectrogram, framed identically, for the offline
//! voice converter.

use serde::{Deserialize, Serialize};

use crate::analysis::f0::F0Tracker;
use crate::analysis::mel::{MelSpectrogram, DEFAULT_MEL_BANDS};
use crate::error::VocalError;

/// Default analysis frame for feature extraction.
pub const FEATURE_FRAME_LEN: usize = 2048;
/// Default hop for feature extraction.
pub const FEATURE_HOP: usize = 512;

/// Features handed to the converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// One F0 value (Hz, 0 = unvoiced) per frame.
    pub f0_curve: Vec<f32>,
    /// Frame-major log mel energies, `frame_count * band_count` values.
    pub mel: Vec<f32>,
    pub frame_count: usize,
    pub band_count: usize,
}

impl FeatureSet {
    /// Mel energies of one frame.
    pub fn mel_frame(&self, index: usize) -> Option<&[f32]> {
        if index >= self.frame_count {
            return None;
        }
        let start = index * self.band_count;
        self.mel.get(start..start + self.band_count)
    }
}

/// Frames a signal and runs the F0 tracker and mel analyser over each frame.
#[derive(Debug)]
pub struct FeatureExtractor {
    frame_len: usize,
    hop: usize,
    f0: F0Tracker,
    mel: MelSpectrogram,
    mel_frame: Vec<f32>,
}

impl FeatureExtractor {
    /// 2048-sample frames, 512 hop, 80 mel bands.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_layout(sample_rate, FEATURE_FRAME_LEN, FEATURE_HOP, DEFAULT_MEL_BANDS)
    }

    /// Custom framing. `hop` is raised to at least one sample.
    pub fn with_layout(sample_rate: u32, frame_len: usize, hop: usize, bands: usize) -> Self {
        Self {
            frame_len,
            hop: hop.max(1),
            f0: F0Tracker::new(sample_rate, frame_len),
            mel: MelSpectrogram::new(sample_rate, frame_len, bands),
            mel_frame: vec![0.0; bands],
        }
    }

    /// Frame length.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Hop between frames.
    #[inline]
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of frames `input_len` samples produce, 0 when shorter than a frame.
    pub fn frame_count(&self, input_len: usize) -> usize {
        if input_len < self.frame_len {
            0
        } else {
            (input_len - self.frame_len) / self.hop + 1
        }
    }

    /// Extracts features from the whole input.
    pub fn extract(&mut self, input: &[f32]) -> Result<FeatureSet, VocalError> {
        let frame_count = self.frame_count(input.len());
        if frame_count == 0 {
            return Err(VocalError::InputTooShort {
                provided: input.len(),
                minimum: self.frame_len,
            });
        }

        let band_count = self.mel.num_bands();
        let mut mel = Vec::with_capacity(frame_count * band_count);
        self.f0.reset();

        for index in 0..frame_count {
            let start = index * self.hop;
            let frame = &input[start..start + self.frame_len];
            self.f0.process_frame(frame);
            self.mel.process_frame(frame, &mut self.mel_frame);
            mel.extend_from_slice(&self.mel_frame);
        }

        log::debug!(
            "extracted {} feature frames ({} mel bands)",
            frame_count,
            band_count
        );

        Ok(FeatureSet {
            f0_curve: self.f0.take_curve(),
            mel,
            frame_count,
            band_count,
        })
    }
}

/// One-shot extraction with the default layout.
pub fn extract_features(input: &[f32], sample_rate: u32) -> Result<FeatureSet, VocalError> {
    FeatureExtractor::new(sample_rate).extract(input)
}
