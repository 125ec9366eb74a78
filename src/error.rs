//! Error types for the vocalshift crate.
//!
//! Only configuration and file I/O report errors. The real-time path degrades
//! to passthrough, 0 Hz or an identity model instead.

use std::fmt;

/// Errors reported by configuration, feature extraction and file I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocalError {
    /// Sample rate must be positive.
    InvalidSampleRate(u32),
    /// Frame length must be a power of two and at least 64.
    InvalidFrameLength(usize),
    /// Hop must be non-zero and shorter than the frame.
    InvalidHop { hop: usize, frame_len: usize },
    /// LPC order must be non-zero and shorter than the frame.
    InvalidLpcOrder { order: usize, frame_len: usize },
    /// Input too short for the requested analysis.
    InputTooShort { provided: usize, minimum: usize },
    /// Malformed file contents.
    InvalidFormat(String),
    /// I/O error.
    IoError(String),
    /// The offline inference collaborator is missing or failed.
    CollaboratorUnavailable(String),
}

impl fmt::Display for VocalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocalError::InvalidSampleRate(sr) => {
                write!(f, "invalid sample rate: {sr}. Must be greater than 0.")
            }
            VocalError::InvalidFrameLength(n) => write!(
                f,
                "invalid frame length: {n}. Must be a power of two and at least 64."
            ),
            VocalError::InvalidHop { hop, frame_len } => write!(
                f,
                "invalid hop: {hop}. Must be in 1..{frame_len} for a frame of {frame_len} samples."
            ),
            VocalError::InvalidLpcOrder { order, frame_len } => write!(
                f,
                "invalid LPC order: {order}. Must be in 1..{frame_len}."
            ),
            VocalError::InputTooShort { provided, minimum } => write!(
                f,
                "input too short: {provided} samples provided, {minimum} required"
            ),
            VocalError::InvalidFormat(msg) => write!(f, "invalid format: {msg}"),
            VocalError::IoError(msg) => write!(f, "I/O error: {msg}"),
            VocalError::CollaboratorUnavailable(msg) => {
                write!(f, "voice converter unavailable: {msg}")
            }
        }
    }
}

impl std::error::Error for VocalError {}

impl From<std::io::Error> for VocalError {
    fn from(err: std::io::Error) -> Self {
        VocalError::IoError(err.to_string())
    }
}
