//! Non-real-time voice conversion: feature extraction, the converter
//! boundary and a background worker.

pub mod collaborator;
pub mod processor;
pub mod worker;

pub use collaborator::{Conversion, ConversionRequest, NoModel, VoiceConverter};
pub use processor::{OfflineOutcome, OfflineStatus, OfflineVoiceProcessor};
pub use worker::OfflineWorker;
