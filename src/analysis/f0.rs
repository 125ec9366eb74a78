//! Frame-by-frame F0 curve for the offline converter.

use crate::analysis::pitch::PitchDetector;
use crate::correct::scale::hz_to_midi;

/// Weight of the previous estimate when smoothing consecutive voiced frames.
pub const F0_SMOOTHING: f32 = 0.3;

/// Runs YIN on successive frames and accumulates a smoothed F0 curve.
#[derive(Debug, Clone)]
pub struct F0Tracker {
    detector: PitchDetector,
    frame_len: usize,
    prev_f0: f32,
    curve: Vec<f32>,
}

impl F0Tracker {
    /// Creates a tracker analysing frames of `frame_len` samples.
    pub fn new(sample_rate: u32, frame_len: usize) -> Self {
        Self {
            detector: PitchDetector::new(sample_rate, frame_len),
            frame_len,
            prev_f0: 0.0,
            curve: Vec::new(),
        }
    }

    /// Frame length handed to the detector.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Detects one frame, appends the smoothed value to the curve and
    /// returns it. Unvoiced frames record 0 and restart the smoothing.
    pub fn process_frame(&mut self, frame: &[f32]) -> f32 {
        let mut f0 = self.detector.detect(frame);
        if f0 > 0.0 {
            if self.prev_f0 > 0.0 {
                f0 = self.prev_f0 * F0_SMOOTHING + f0 * (1.0 - F0_SMOOTHING);
            }
            self.prev_f0 = f0;
        } else {
            f0 = 0.0;
            self.prev_f0 = 0.0;
        }
        self.curve.push(f0);
        f0
    }

    /// F0 values recorded so far, in Hz.
    #[inline]
    pub fn curve(&self) -> &[f32] {
        &self.curve
    }

    /// The curve as MIDI note numbers; unvoiced frames stay 0.
    pub fn curve_as_midi(&self) -> Vec<f32> {
        self.curve
            .iter()
            .map(|&hz| {
                if hz > 0.0 {
                    hz_to_midi(hz as f64) as f32
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Takes the recorded curve, leaving the tracker empty.
    pub fn take_curve(&mut self) -> Vec<f32> {
        self.prev_f0 = 0.0;
        std::mem::take(&mut self.curve)
    }

    /// Clears the curve and smoothing state.
    pub fn reset(&mut self) {
        self.curve.clear();
        self.prev_f0 = 0.0;
    }
}
