//! Error types for rf2-vcr

use std::io;
use thiserror::Error;

/// Result type for rf2-vcr operations that touch the outside world
pub type Result<T> = std::result::Result<T, VcrError>;

/// Terminal decode failures
///
/// Every variant identifies the absolute byte offset at which the problem
/// was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input does not start with the replay magic signature
    #[error("Unrecognized format: expected replay magic, found {found:02x?}")]
    UnrecognizedFormat {
        /// The bytes found where the magic was expected (shorter if truncated)
        found: Vec<u8>,
    },

    /// Section table is inconsistent with the buffer or with itself
    #[error("Malformed header at offset {offset}: {reason}")]
    MalformedHeader {
        /// Offset of the offending table entry
        offset: usize,
        /// What was wrong
        reason: String,
    },

    /// A read would have gone past the end of the available bytes
    #[error("Read out of bounds at offset {offset}: needed {needed} bytes, {available} available")]
    OutOfBounds {
        /// Offset where the read started
        offset: usize,
        /// Bytes the read required
        needed: usize,
        /// Bytes actually left
        available: usize,
    },

    /// A length field that cannot be trusted
    #[error("Malformed length at offset {offset}: declared {declared}, only {available} allowed")]
    MalformedLength {
        /// Offset of the length field
        offset: usize,
        /// The declared length or count
        declared: usize,
        /// The most the buffer or limits allow
        available: usize,
    },

    /// Format version rejected by the configured policy
    #[error("Unknown format version {version}")]
    UnknownVersion {
        /// Raw version number from the header
        version: u32,
    },
}

impl DecodeError {
    /// Byte offset at which the failure was detected
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnrecognizedFormat { .. } => 0,
            Self::UnknownVersion { .. } => 4,
            Self::MalformedHeader { offset, .. }
            | Self::OutOfBounds { offset, .. }
            | Self::MalformedLength { offset, .. } => *offset,
        }
    }

    pub(crate) fn malformed_header(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while loading, configuring, or decoding replays
#[derive(Debug, Error)]
pub enum VcrError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replay could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}
