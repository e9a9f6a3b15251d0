//! # Delay Line (Power-of-Two Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! fixed number of samples. Picture a circular tape loop: a write head
//! records incoming audio, a read head a few positions behind it plays it
//! back. The distance between the heads is the delay.
//!
//! ## Why a power of two?
//!
//! Every position into the ring has to wrap back into `[0, len)`. With an
//! arbitrary length that's a modulo (`%`), which is an integer division on
//! every sample. When `len` is a power of two the same wrap is a single
//! AND with `len - 1`:
//!
//! ```text
//! len      = 8          = 0b1000
//! mask     = len - 1    = 0b0111
//! 13 & mask             = 0b1101 & 0b0111 = 0b0101 = 5   (same as 13 % 8)
//! ```
//!
//! So the buffer is rounded up to the next power of two above the longest
//! delay we support. At 44.1 kHz, five seconds is 220500 samples, which
//! rounds up to 262144 (about 1 MB of `f32` per channel).
//!
//! ## No write head in here
//!
//! Unlike a self-contained delay line, this one doesn't track its own
//! write position. Both channels of the stereo engine share a single
//! write cursor, so the engine owns the cursor and passes absolute
//! positions in. The line only masks them.

use std::collections::TryReserveError;

/// Smallest power-of-two buffer length that holds `max_delay_seconds` of
/// audio at `sample_rate`.
///
/// The product is rounded *up* before picking the power of two, so the
/// result is never shorter than `sample_rate * max_delay_seconds`, even
/// for fractional rates. Returns `None` if the length would not fit in a
/// `usize`.
pub fn buffer_size_for(sample_rate: f32, max_delay_seconds: f32) -> Option<usize> {
    let min_len = (f64::from(sample_rate) * f64::from(max_delay_seconds)).ceil();
    if !min_len.is_finite() || min_len >= usize::MAX as f64 {
        return None;
    }

    // A length of zero would leave no slot to read from, so the smallest
    // buffer is a single sample.
    (min_len as usize).max(1).checked_next_power_of_two()
}

/// Allocate `len` zeroed samples, reporting failure instead of aborting.
pub fn try_alloc_zeroed(len: usize) -> Result<Vec<f32>, TryReserveError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    // Capacity is already reserved, so this never reallocates.
    buffer.resize(len, 0.0);
    Ok(buffer)
}

/// One channel's worth of delay history.
///
/// The length is fixed at construction and is always a power of two.
/// There is no resizing API: the engine that owns the line owns its
/// length for its whole lifetime.
#[derive(Debug)]
pub struct DelayLine {
    buffer: Vec<f32>,

    /// `buffer.len() - 1`. AND-ing any position with this wraps it into
    /// the buffer.
    mask: usize,
}

impl DelayLine {
    /// Wrap an already allocated, zeroed buffer.
    ///
    /// `buffer.len()` must be a non-zero power of two.
    pub fn from_buffer(buffer: Vec<f32>) -> Self {
        debug_assert!(
            buffer.len().is_power_of_two(),
            "delay line length {} is not a power of two",
            buffer.len()
        );
        let mask = buffer.len() - 1;
        Self { buffer, mask }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always `false`: a delay line holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The value of `len() - 1`, for callers that wrap positions themselves.
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Read the sample stored at `position`, wrapped into the buffer.
    #[inline]
    pub fn read(&self, position: usize) -> f32 {
        self.buffer[position & self.mask]
    }

    /// Store `sample` at `position`, wrapped into the buffer.
    #[inline]
    pub fn write(&mut self, position: usize, sample: f32) {
        self.buffer[position & self.mask] = sample;
    }

    /// Overwrite the whole history with silence.
    ///
    /// Doesn't allocate; the buffer keeps its length.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
