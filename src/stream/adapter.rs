//! Host-block to fixed-frame adapter with overlap-add resynthesis.
//!
//! Every input sample is written into a frame-length ring; every output
//! sample is read from an overlap-add accumulator at the same position.
//! Once the ring is full, each `hop` samples the ring is unrolled into a
//! frame, handed to the frame callback, and the callback's output is
//! scattered back so that it emerges exactly `frame_len - hop` samples
//! after the input that produced it. Block boundaries have no effect on the
//! result.

use crate::core::fft::WINDOW_SUM_EPSILON;
use crate::core::ring_buffer::{FixedRing, OverlapAdd};
use crate::error::VocalError;

/// Frame adapter state.
#[derive(Debug, Clone)]
pub struct StreamingFrameAdapter {
    frame_len: usize,
    hop: usize,
    input: FixedRing<f32>,
    ola: OverlapAdd,
    weights: Vec<f32>,
    frame: Vec<f32>,
    synth: Vec<f32>,
    since_hop: usize,
    frames_processed: u64,
}

impl StreamingFrameAdapter {
    /// Creates an adapter. `weights` is the per-sample weight the frame
    /// callback's output carries (for a vocoder, analysis x synthesis window)
    /// and must hold `frame_len` values.
    pub fn new(frame_len: usize, hop: usize, weights: &[f32]) -> Result<Self, VocalError> {
        if frame_len == 0 || weights.len() != frame_len {
            return Err(VocalError::InvalidFrameLength(frame_len));
        }
        if hop == 0 || hop >= frame_len {
            return Err(VocalError::InvalidHop { hop, frame_len });
        }
        Ok(Self {
            frame_len,
            hop,
            input: FixedRing::with_capacity(frame_len),
            ola: OverlapAdd::new(frame_len, WINDOW_SUM_EPSILON),
            weights: weights.to_vec(),
            frame: vec![0.0; frame_len],
            synth: vec![0.0; frame_len],
            since_hop: 0,
            frames_processed: 0,
        })
    }

    /// Frame length.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Hop.
    #[inline]
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Delay between an input sample and the processed output it produces.
    #[inline]
    pub fn latency_samples(&self) -> usize {
        self.frame_len - self.hop
    }

    /// True once a full frame has been buffered; before that, output is dry.
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.input.is_full()
    }

    /// Frames handed to the callback since construction or reset.
    #[inline]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Processes a block in place.
    ///
    /// `on_frame(frame, out)` receives the last `frame_len` input samples in
    /// order, oldest first, and must fill `out` with the weighted
    /// resynthesis.
    pub fn process<F>(&mut self, block: &mut [f32], mut on_frame: F)
    where
        F: FnMut(&[f32], &mut [f32]),
    {
        for sample in block.iter_mut() {
            let dry = *sample;
            let filling = !self.input.is_full();
            let slot = self.input.cursor();

            self.input.write(dry);
            let wet = self.ola.take(slot);
            *sample = if filling { dry } else { wet };

            self.input.advance();
            self.since_hop += 1;

            if self.input.is_full() && self.since_hop >= self.hop {
                self.since_hop = 0;
                self.run_frame(&mut on_frame);
            }
        }
    }

    fn run_frame<F>(&mut self, on_frame: &mut F)
    where
        F: FnMut(&[f32], &mut [f32]),
    {
        self.input.copy_ordered(&mut self.frame);
        on_frame(&self.frame, &mut self.synth);
        self.frames_processed += 1;

        // Frame sample n is due `latency` samples after input sample n, i.e.
        // at slot cursor + n - hop. Samples n < hop are already past.
        let start = (self.input.cursor() + self.frame_len - self.hop) % self.frame_len;
        self.ola
            .accumulate(start, &self.synth, &self.weights, self.hop);
    }

    /// Clears buffered audio; the next `frame_len` samples pass dry again.
    pub fn reset(&mut self) {
        self.input.clear();
        self.ola.clear();
        self.since_hop = 0;
        self.frames_processed = 0;
    }
}
