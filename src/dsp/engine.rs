//! # Stereo Delay Engine
//!
//! Two [`DelayLine`]s (left and right) driven by one shared write cursor.
//! Each channel has its own delay time and dry/wet balance, read once at
//! the start of every block.
//!
//! ## Per-sample algorithm
//!
//! ```text
//!                 ┌─────────── × dry ──────────────┐
//! input[i] ──────┤                                 (+)──► output[i]
//!                 │   buffer[read_base + i] × wet ─┘
//!                 │
//!                 └──► buffer[write_cursor + i]    (after the read)
//! ```
//!
//! where `read_base = write_cursor + buffer_size - delay_samples`. Adding
//! `buffer_size` before subtracting keeps the value non-negative; the
//! mask wraps it back into the buffer.
//!
//! The write happens *after* the read for the same index. With a delay of
//! zero the read and write land on the same slot, so the output is
//! whatever was stored there one full buffer ago, not the sample that is
//! about to be written.
//!
//! Delay time is not smoothed. Moving it while audio plays makes the read
//! head jump, which clicks. That's the expected sound of this effect.

use std::collections::TryReserveError;
use std::fmt;

use nih_plug::nih_debug_assert;

use super::delay_line::{buffer_size_for, try_alloc_zeroed, DelayLine};
use crate::error::EngineError;

/// Longest supported delay, in seconds. Control values above this are
/// clamped down to it.
pub const MAX_DELAY_SECONDS: f32 = 5.0;

/// One side of the stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const BOTH: [Channel; 2] = [Channel::Left, Channel::Right];

    pub const fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Left => f.write_str("left"),
            Channel::Right => f.write_str("right"),
        }
    }
}

/// Control values for one channel, as the host supplied them.
///
/// Nothing here is validated. The engine clamps both values when it
/// reads them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelControls {
    /// Delay time in seconds, meaningful in `[0, MAX_DELAY_SECONDS]`.
    pub delay_seconds: f32,
    /// `0.0` is fully dry, `1.0` fully wet.
    pub dry_wet: f32,
}

impl Default for ChannelControls {
    fn default() -> Self {
        Self {
            delay_seconds: 1.0,
            dry_wet: 0.5,
        }
    }
}

/// Control values for both channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Controls {
    pub left: ChannelControls,
    pub right: ChannelControls,
}

impl Controls {
    /// The same delay and dry/wet on both channels.
    pub fn both(delay_seconds: f32, dry_wet: f32) -> Self {
        let channel = ChannelControls {
            delay_seconds,
            dry_wet,
        };
        Self {
            left: channel,
            right: channel,
        }
    }

    pub fn channel(&self, channel: Channel) -> ChannelControls {
        match channel {
            Channel::Left => self.left,
            Channel::Right => self.right,
        }
    }
}

/// Where a block's input samples come from and its output samples go.
///
/// The engine reads `input(channel, i)` before it calls
/// `set_output(channel, i, ..)` for the same `channel` and `i`, so an
/// implementation may back both with the same memory (in-place
/// processing).
pub trait StereoIo {
    /// How many samples every channel can supply and accept.
    fn frames(&self) -> usize;

    fn input(&self, channel: Channel, index: usize) -> f32;

    fn set_output(&mut self, channel: Channel, index: usize, sample: f32);
}

/// Separate input and output slices per channel.
pub struct SplitIo<'a> {
    inputs: [&'a [f32]; 2],
    outputs: [&'a mut [f32]; 2],
}

impl<'a> SplitIo<'a> {
    /// `inputs` and `outputs` are `[left, right]`.
    pub fn new(inputs: [&'a [f32]; 2], outputs: [&'a mut [f32]; 2]) -> Self {
        Self { inputs, outputs }
    }
}

impl StereoIo for SplitIo<'_> {
    fn frames(&self) -> usize {
        self.inputs
            .iter()
            .map(|s| s.len())
            .chain(self.outputs.iter().map(|s| s.len()))
            .min()
            .unwrap_or(0)
    }

    #[inline]
    fn input(&self, channel: Channel, index: usize) -> f32 {
        self.inputs[channel.index()][index]
    }

    #[inline]
    fn set_output(&mut self, channel: Channel, index: usize, sample: f32) {
        self.outputs[channel.index()][index] = sample;
    }
}

/// One buffer per channel, overwritten with the output. This is how
/// plugin hosts usually hand audio over.
pub struct InPlaceIo<'a> {
    channels: [&'a mut [f32]; 2],
}

impl<'a> InPlaceIo<'a> {
    pub fn new(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        Self {
            channels: [left, right],
        }
    }
}

impl StereoIo for InPlaceIo<'_> {
    fn frames(&self) -> usize {
        self.channels[0].len().min(self.channels[1].len())
    }

    #[inline]
    fn input(&self, channel: Channel, index: usize) -> f32 {
        self.channels[channel.index()][index]
    }

    #[inline]
    fn set_output(&mut self, channel: Channel, index: usize, sample: f32) {
        self.channels[channel.index()][index] = sample;
    }
}

/// Clamp into `[0, max]`. NaN lands on `0`.
#[inline]
fn limit(value: f32, max: f32) -> f32 {
    if value > 0.0 {
        value.min(max)
    } else {
        0.0
    }
}

/// Per-channel values derived from the controls once per block.
#[derive(Clone, Copy)]
struct Tap {
    read_base: usize,
    dry: f32,
    wet: f32,
}

/// The stereo delay line.
///
/// Owns both channel buffers outright. They are allocated together in
/// [`DelayEngine::new`], never resized, and freed together when the
/// engine is dropped.
#[derive(Debug)]
pub struct DelayEngine {
    sample_rate: f32,

    /// `[left, right]`. Both have the same power-of-two length.
    lines: [DelayLine; 2],

    /// Where sample 0 of the next block is written, in `[0, buffer_size)`.
    write_cursor: usize,
}

impl DelayEngine {
    /// Allocate a silent engine for `sample_rate`.
    ///
    /// Each channel gets the smallest power-of-two buffer that holds
    /// [`MAX_DELAY_SECONDS`] of audio.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSampleRate`] if the rate isn't positive and
    /// finite, [`EngineError::AllocationFailure`] if either buffer can't be
    /// allocated.
    pub fn new(sample_rate: f32) -> Result<Self, EngineError> {
        Self::with_allocator(sample_rate, |_, len| try_alloc_zeroed(len))
    }

    /// Like [`new`](Self::new), with the buffer allocation supplied by the
    /// caller. `alloc` must return `len` zeroed samples.
    pub(crate) fn with_allocator<A>(sample_rate: f32, mut alloc: A) -> Result<Self, EngineError>
    where
        A: FnMut(Channel, usize) -> Result<Vec<f32>, TryReserveError>,
    {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }

        let len = buffer_size_for(sample_rate, MAX_DELAY_SECONDS).ok_or(
            EngineError::AllocationFailure {
                channel: Channel::Left,
                len: usize::MAX,
                source: None,
            },
        )?;

        let mut allocate = |channel: Channel| {
            alloc(channel, len)
                .map(DelayLine::from_buffer)
                .map_err(|source| EngineError::AllocationFailure {
                    channel,
                    len,
                    source: Some(source),
                })
        };

        // If the right buffer fails, the left one is dropped on the way out.
        let left = allocate(Channel::Left)?;
        let right = allocate(Channel::Right)?;

        Ok(Self {
            sample_rate,
            lines: [left, right],
            write_cursor: 0,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Length of each channel's buffer, in samples. Always a power of two.
    pub fn buffer_size(&self) -> usize {
        self.lines[0].len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Convert a delay time to whole samples: clamp to
    /// `[0, MAX_DELAY_SECONDS]`, multiply by the sample rate, truncate.
    pub fn delay_samples(&self, delay_seconds: f32) -> usize {
        let samples = (limit(delay_seconds, MAX_DELAY_SECONDS) * self.sample_rate) as usize;
        samples.min(self.buffer_size())
    }

    /// How long the last echo keeps sounding after the input stops.
    pub fn tail_samples(&self, controls: &Controls) -> u32 {
        let longest = self
            .delay_samples(controls.left.delay_seconds)
            .max(self.delay_samples(controls.right.delay_seconds));
        u32::try_from(longest).unwrap_or(u32::MAX)
    }

    /// Silence the delay history of both channels.
    ///
    /// The write cursor is left where it is. No memory is allocated, so
    /// this is safe to call whenever the host reactivates the plugin.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    /// Run one block of `sample_count` samples through the delay.
    ///
    /// Controls are read once, up front. Out-of-range values are clamped.
    /// Runs in time proportional to `sample_count` and never allocates.
    ///
    /// If `io` holds fewer than `sample_count` frames, only those are
    /// processed and the cursor advances by that many.
    pub fn process<I>(&mut self, controls: &Controls, io: &mut I, sample_count: usize)
    where
        I: StereoIo + ?Sized,
    {
        nih_debug_assert!(
            sample_count <= io.frames(),
            "block of {} samples but only {} frames connected",
            sample_count,
            io.frames()
        );
        let sample_count = sample_count.min(io.frames());

        let buffer_size = self.buffer_size();
        let write_cursor = self.write_cursor;
        let taps = Channel::BOTH.map(|channel| {
            let ChannelControls {
                delay_seconds,
                dry_wet,
            } = controls.channel(channel);
            let wet = limit(dry_wet, 1.0);
            Tap {
                read_base: write_cursor + buffer_size - self.delay_samples(delay_seconds),
                dry: 1.0 - wet,
                wet,
            }
        });

        for i in 0..sample_count {
            for channel in Channel::BOTH {
                let tap = taps[channel.index()];
                let line = &mut self.lines[channel.index()];

                let input = io.input(channel, i);
                let delayed = line.read(tap.read_base.wrapping_add(i));
                io.set_output(channel, i, tap.dry * input + tap.wet * delayed);

                line.write(write_cursor.wrapping_add(i), input);
            }
        }

        self.write_cursor = write_cursor.wrapping_add(sample_count) & self.lines[0].mask();
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
