//! Fixed-capacity rings for the real-time frame adapter.
//!
//! Both types allocate once at construction and never shift memory. All
//! wraparound arithmetic lives here.

/// Circular array with a single write cursor.
///
/// Positions are addressed relative to the cursor, so `read_at(0)` after an
/// [`advance`](FixedRing::advance) on a full ring is the oldest sample.
#[derive(Debug, Clone)]
pub struct FixedRing<T>
where
    T: Copy + Default,
{
    data: Vec<T>,
    cursor: usize,
    filled: usize,
}

impl<T> FixedRing<T>
where
    T: Copy + Default,
{
    /// Creates a ring with fixed capacity. A zero capacity is bumped to one.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: vec![T::default(); cap.max(1)],
            cursor: 0,
            filled: 0,
        }
    }

    /// Fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current write position in `[0, capacity)`.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of slots written since construction or the last clear, capped
    /// at the capacity.
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// True once every slot holds a written value.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.filled == self.data.len()
    }

    /// Stores `value` at the cursor without moving it.
    #[inline]
    pub fn write(&mut self, value: T) {
        self.data[self.cursor] = value;
    }

    /// Moves the cursor one slot forward.
    #[inline]
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.data.len();
        if self.filled < self.data.len() {
            self.filled += 1;
        }
    }

    /// Writes at the cursor and advances.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.write(value);
        self.advance();
    }

    /// Reads the slot `offset` positions after the cursor.
    #[inline]
    pub fn read_at(&self, offset: usize) -> T {
        self.data[(self.cursor + offset) % self.data.len()]
    }

    /// Copies the ring into `out` in logical order, starting at the cursor.
    ///
    /// Returns the number of copied elements.
    pub fn copy_ordered(&self, out: &mut [T]) -> usize {
        let n = out.len().min(self.data.len());
        let first = n.min(self.data.len() - self.cursor);
        out[..first].copy_from_slice(&self.data[self.cursor..self.cursor + first]);
        let second = n - first;
        if second > 0 {
            out[first..n].copy_from_slice(&self.data[..second]);
        }
        n
    }

    /// Zeroes the contents and rewinds the cursor.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = T::default());
        self.cursor = 0;
        self.filled = 0;
    }
}

/// Overlap-add accumulator: a signal ring paired with a gain ring of the
/// same length.
///
/// Frames are scattered in with their window weights; reading a slot divides
/// the accumulated signal by the accumulated weight and clears both.
#[derive(Debug, Clone)]
pub struct OverlapAdd {
    signal: Vec<f32>,
    gain: Vec<f32>,
    epsilon: f32,
}

impl OverlapAdd {
    /// Creates an accumulator of `len` slots. Slots whose gain is below
    /// `epsilon` are emitted raw.
    pub fn new(len: usize, epsilon: f32) -> Self {
        let len = len.max(1);
        Self {
            signal: vec![0.0; len],
            gain: vec![0.0; len],
            epsilon,
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    /// Always false; the accumulator has at least one slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// Adds `frame[n]` to the signal ring and `weights[n]` to the gain ring
    /// for every `n >= skip`, at slots starting from `start` and wrapping.
    pub fn accumulate(&mut self, start: usize, frame: &[f32], weights: &[f32], skip: usize) {
        let len = self.signal.len();
        for (n, (&x, &w)) in frame.iter().zip(weights.iter()).enumerate().skip(skip) {
            let idx = (start + n) % len;
            self.signal[idx] += x;
            self.gain[idx] += w;
        }
    }

    /// Reads the normalized value at `index` and clears the slot.
    #[inline]
    pub fn take(&mut self, index: usize) -> f32 {
        let s = self.signal[index];
        let g = self.gain[index];
        self.signal[index] = 0.0;
        self.gain[index] = 0.0;
        if g.abs() < self.epsilon {
            s
        } else {
            s / g
        }
    }

    /// Zeroes both rings.
    pub fn clear(&mut self) {
        self.signal.iter_mut().for_each(|v| *v = 0.0);
        self.gain.iter_mut().for_each(|v| *v = 0.0);
    }
}
