//! # Error Types
//!
//! Only instantiation can fail. Once an engine exists, every call on it
//! succeeds: out-of-range parameter values are clamped, not rejected.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::dsp::engine::Channel;
use crate::ports::{Port, PortKind};

/// Errors raised while creating a [`DelayEngine`](crate::dsp::engine::DelayEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host handed us a sample rate we can't size a buffer from.
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    /// A delay buffer could not be allocated. Any buffer already
    /// allocated during the same attempt has been released.
    #[error("could not allocate a {len}-sample delay buffer for the {channel} channel")]
    AllocationFailure {
        /// The channel whose buffer failed.
        channel: Channel,
        /// Requested length in samples (`usize::MAX` if the size overflowed).
        len: usize,
        /// The allocator's error. `None` when the buffer size itself
        /// could not be represented.
        #[source]
        source: Option<TryReserveError>,
    },
}

/// Errors raised while connecting a port on an
/// [`Instance`](crate::instance::Instance).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The index is outside the fixed 8-port table.
    #[error("no port with index {0}")]
    UnknownPort(usize),

    /// A control location was given for an audio port, or vice versa.
    #[error("port {port:?} expects a {expected:?} location")]
    KindMismatch {
        /// The port being connected.
        port: Port,
        /// The kind of location that port accepts.
        expected: PortKind,
    },
}
