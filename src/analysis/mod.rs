//! Signal analysis: pitch, onsets, LPC envelope and offline features.

pub mod f0;
pub mod features;
pub mod lpc;
pub mod mel;
pub mod pitch;
pub mod transient;

pub use f0::F0Tracker;
pub use features::{extract_features, FeatureExtractor, FeatureSet};
pub use lpc::LpcAnalyzer;
pub use mel::MelSpectrogram;
pub use pitch::PitchDetector;
pub use transient::TransientDetector;
