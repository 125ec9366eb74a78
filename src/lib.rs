#![forbid(unsafe_code)]
//! Real-time vocal pitch correction, pitch/formant shifting and voice
//! character for mono audio.
//!
//! `vocalshift` detects the fundamental of each frame (YIN), optionally pulls
//! it toward the nearest note of a musical scale, resynthesizes the frame at
//! the new pitch with a phase vocoder whose LPC envelope correction keeps
//! (or moves) the formants, and finishes with breath noise and a resonance
//! peak.
//!
//! # Quick Start
//!
//! ```
//! use vocalshift::{EngineConfig, ParamSnapshot, ScaleType};
//!
//! // 1 second of a slightly flat A3 at 44.1 kHz
//! let input: Vec<f32> = (0..44100)
//!     .map(|i| (2.0 * std::f32::consts::PI * 216.0 * i as f32 / 44100.0).sin() * 0.5)
//!     .collect();
//!
//! let params = ParamSnapshot {
//!     correction_amount: 1.0,
//!     correction_speed: 0.0,
//!     scale: ScaleType::Minor,
//!     key: 9,
//!     ..ParamSnapshot::default()
//! };
//! let output = vocalshift::render(&input, &EngineConfig::default(), &params, 512).unwrap();
//! assert_eq!(output.len(), input.len());
//! ```
//!
//! # Streaming
//!
//! In a host callback, hand each block to [`VocalEngine::process_block`]
//! with a snapshot read from [`EngineControls`]:
//!
//! ```
//! use vocalshift::{EngineConfig, EngineControls, VocalEngine};
//!
//! let mut engine = VocalEngine::new(EngineConfig::new(48000)).unwrap();
//! let controls = EngineControls::default();
//! controls.set_pitch_shift(-12.0);
//!
//! let mut block = vec![0.0f32; 480];
//! engine.process_block(&mut block, &controls.snapshot());
//! assert_eq!(engine.latency_samples(), 1536);
//! ```

pub mod analysis;
pub mod core;
pub mod correct;
pub mod error;
pub mod io;
pub mod offline;
pub mod shift;
pub mod stream;
pub mod voice;

pub use analysis::{extract_features, FeatureSet, PitchDetector};
pub use core::types::{EngineConfig, EnvelopeStrategy, ParamSnapshot, ScaleType};
pub use core::window::WindowType;
pub use correct::{PitchCorrector, Scale};
pub use error::VocalError;
pub use io::Preset;
pub use offline::{OfflineVoiceProcessor, OfflineWorker, VoiceConverter};
pub use shift::PhaseVocoder;
pub use stream::{EngineControls, StreamingFrameAdapter, VocalEngine};
pub use voice::VoiceCharacter;

/// Host block size used when the caller passes 0.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Runs a whole buffer through a fresh [`VocalEngine`] in `block_size`
/// chunks and removes the engine latency, so output sample `i` lines up
/// with input sample `i`.
///
/// The first `hop` output samples are the dry input: no complete frame
/// covers them yet.
///
/// # Errors
///
/// Returns the configuration error if `config` is invalid.
pub fn render(
    input: &[f32],
    config: &EngineConfig,
    params: &ParamSnapshot,
    block_size: usize,
) -> Result<Vec<f32>, VocalError> {
    render_with_notes(input, config, params, None, block_size)
}

/// [`render`] with an optional custom note mask for the corrector.
pub fn render_with_notes(
    input: &[f32],
    config: &EngineConfig,
    params: &ParamSnapshot,
    active_notes: Option<[bool; 12]>,
    block_size: usize,
) -> Result<Vec<f32>, VocalError> {
    let mut engine = VocalEngine::new(config.clone())?;
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let block_size = if block_size == 0 {
        DEFAULT_BLOCK_SIZE
    } else {
        block_size
    };
    let latency = engine.latency_samples();

    // Key and scale reach the corrector on the first block; the custom mask
    // has to be installed after that or the key change would clear it.
    let mut padded = Vec::with_capacity(input.len() + latency);
    padded.extend_from_slice(input);
    padded.resize(input.len() + latency, 0.0);

    let mut first = true;
    for block in padded.chunks_mut(block_size) {
        if first {
            let (head, tail) = block.split_at_mut(1);
            engine.process_block(head, params);
            if let Some(notes) = active_notes {
                if !engine.set_active_notes(notes) {
                    log::warn!("ignoring empty note mask");
                }
            }
            engine.process_block(tail, params);
            first = false;
        } else {
            engine.process_block(block, params);
        }
    }

    let hop = config.hop.min(input.len());
    let mut output = Vec::with_capacity(input.len());
    output.extend_from_slice(&input[..hop]);
    output.extend_from_slice(&padded[latency + hop..latency + input.len()]);
    log::debug!(
        "rendered {} samples in blocks of {} (latency {} compensated)",
        input.len(),
        block_size,
        latency
    );
    Ok(output)
}

/// Estimates the fundamental of a buffer in Hz (0 when unvoiced).
pub fn detect_pitch(samples: &[f32], sample_rate: u32) -> f32 {
    if samples.is_empty() || sample_rate == 0 {
        return 0.0;
    }
    PitchDetector::new(sample_rate, samples.len()).detect(samples)
}

/// Reads a WAV file, renders it and writes the result.
pub fn render_wav_file(
    input_path: &str,
    output_path: &str,
    params: &ParamSnapshot,
    encoding: io::WavEncoding,
) -> Result<(), VocalError> {
    let audio = io::read_wav_file(input_path)?;
    let config = EngineConfig::new(audio.sample_rate);
    let output = render(&audio.samples, &config, params, DEFAULT_BLOCK_SIZE)?;
    io::write_wav_file(output_path, &output, audio.sample_rate, encoding)
}
