//! The real-time vocal chain: detect, correct, shift, colour.
//!
//! `process_block` never allocates, locks or fails. Everything it touches is
//! sized in [`VocalEngine::configure`].

use crate::analysis::pitch::PitchDetector;
use crate::core::types::{clamp_ratio, EngineConfig, ParamSnapshot, ScaleType};
use crate::correct::corrector::PitchCorrector;
use crate::error::VocalError;
use crate::shift::phase_vocoder::PhaseVocoder;
use crate::stream::adapter::StreamingFrameAdapter;
use crate::voice::character::VoiceCharacter;

/// Correction amounts at or below this skip the corrector.
const CORRECTION_THRESHOLD: f32 = 0.01;

/// Streaming vocal processor.
#[derive(Debug)]
pub struct VocalEngine {
    config: EngineConfig,
    adapter: StreamingFrameAdapter,
    detector: PitchDetector,
    corrector: PitchCorrector,
    vocoder: PhaseVocoder,
    character: VoiceCharacter,
    key: u8,
    scale: ScaleType,
    current_pitch: f32,
    target_pitch: f32,
}

impl VocalEngine {
    /// Validates `config` and allocates every buffer.
    pub fn new(config: EngineConfig) -> Result<Self, VocalError> {
        config.validate()?;
        let vocoder = PhaseVocoder::new(&config);
        let adapter =
            StreamingFrameAdapter::new(config.frame_len, config.hop, vocoder.synthesis_weights())?;
        let defaults = ParamSnapshot::default();

        log::info!(
            "configured vocal engine: {} Hz, frame {}, hop {}, LPC order {}, envelope {:?}",
            config.sample_rate,
            config.frame_len,
            config.hop,
            config.lpc_order,
            config.envelope
        );
        log::debug!(
            "latency {} samples, {} bins, bin width {:.2} Hz",
            config.latency_samples(),
            vocoder.num_bins(),
            config.sample_rate as f32 / config.frame_len as f32
        );

        Ok(Self {
            detector: PitchDetector::new(config.sample_rate, config.frame_len),
            corrector: PitchCorrector::new(defaults.key, defaults.scale),
            character: VoiceCharacter::new(config.sample_rate),
            key: defaults.key,
            scale: defaults.scale,
            current_pitch: 0.0,
            target_pitch: 0.0,
            adapter,
            vocoder,
            config,
        })
    }

    /// Re-allocates for a new configuration (sample rate, frame, hop or LPC
    /// order change). On error the engine keeps its previous configuration.
    ///
    /// Key, scale and any custom note mask survive reconfiguration.
    pub fn configure(&mut self, config: EngineConfig) -> Result<(), VocalError> {
        let mut fresh = Self::new(config)?;
        fresh.corrector = self.corrector.clone();
        fresh.corrector.reset();
        fresh.key = self.key;
        fresh.scale = self.scale;
        *self = fresh;
        Ok(())
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Samples of delay the host should compensate for.
    #[inline]
    pub fn latency_samples(&self) -> usize {
        self.adapter.latency_samples()
    }

    /// Last detected fundamental in Hz (0 when unvoiced).
    #[inline]
    pub fn current_pitch(&self) -> f32 {
        self.current_pitch
    }

    /// Fundamental the last frame was shifted to, in Hz (0 when unvoiced).
    #[inline]
    pub fn target_pitch(&self) -> f32 {
        self.target_pitch
    }

    /// Whether the last processed frame had its pitch shift suppressed by
    /// the transient gate.
    #[inline]
    pub fn last_frame_bypassed(&self) -> bool {
        self.vocoder.last_report().bypassed
    }

    /// Active-note mask used by the corrector.
    #[inline]
    pub fn active_notes(&self) -> [bool; 12] {
        self.corrector.active_notes()
    }

    /// Replaces the corrector's mask with an explicit selection. Rejected
    /// (returns false) when no note is active. The mask holds until the key
    /// or scale control changes.
    pub fn set_active_notes(&mut self, notes: [bool; 12]) -> bool {
        self.corrector.set_active_notes(notes)
    }

    /// Processes one host block in place.
    pub fn process_block(&mut self, samples: &mut [f32], params: &ParamSnapshot) {
        if samples.is_empty() {
            return;
        }
        for s in samples.iter_mut() {
            if !s.is_finite() {
                *s = 0.0;
            }
        }

        let p = params.sanitized();
        if p.key != self.key || p.scale != self.scale {
            self.corrector.set_key_and_scale(p.key, p.scale);
            self.key = p.key;
            self.scale = p.scale;
        }

        let frame_len = self.config.frame_len;
        let shift_ratio = p.pitch_shift_ratio();
        let formant_ratio = p.formant_ratio();

        // A block holding a whole frame is analysed once up front.
        let block_pitch = if samples.len() >= frame_len {
            Some(self.detector.detect(&samples[..frame_len]))
        } else {
            None
        };

        let Self {
            adapter,
            detector,
            corrector,
            vocoder,
            current_pitch,
            target_pitch,
            ..
        } = self;

        adapter.process(samples, |frame, out| {
            let detected = block_pitch.unwrap_or_else(|| detector.detect(frame));
            let ratio = if p.correction_amount <= CORRECTION_THRESHOLD {
                // Re-enabling correction starts from the note, not an old glide.
                corrector.reset();
                shift_ratio
            } else if detected > 0.0 {
                let corrected =
                    corrector.correct(detected, p.correction_amount, p.correction_speed);
                corrected / detected * shift_ratio
            } else {
                shift_ratio
            };
            let ratio = clamp_ratio(ratio);

            *current_pitch = detected;
            *target_pitch = detected * ratio;
            vocoder.process_frame(frame, ratio, formant_ratio, out);
        });

        self.character.process(
            samples,
            p.breath_amount,
            p.resonance_amount,
            p.resonance_freq_hz,
        );

        if self.config.soft_clip {
            for s in samples.iter_mut() {
                *s = s.tanh();
            }
        }
    }

    /// Drops all buffered audio and analysis history.
    pub fn reset(&mut self) {
        self.adapter.reset();
        self.vocoder.reset();
        self.corrector.reset();
        self.character.reset();
        self.current_pitch = 0.0;
        self.target_pitch = 0.0;
    }
}
