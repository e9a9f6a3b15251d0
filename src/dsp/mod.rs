//! # DSP (Digital Signal Processing)
//!
//! Everything that runs on the audio thread:
//!
//! - **`delay_line`**: one channel's power-of-two ring buffer, plus the
//!   buffer sizing and fallible allocation helpers.
//!
//! - **`engine`**: the stereo delay. Two delay lines sharing one write
//!   cursor, with per-channel delay time and dry/wet mixing.

pub mod delay_line;
pub mod engine;
