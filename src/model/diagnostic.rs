//! Recoverable decode conditions attached to the finished model

use std::fmt;

use thiserror::Error;

use crate::error::DecodeError;
use crate::format::{FormatVariant, SectionKind};

/// What went wrong, or what the decoder had to guess
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    /// Header version is not one this crate knows
    #[error("unknown format version {version}, read as {fallback}")]
    UnknownVersion {
        /// Raw version number
        version: u32,
        /// Variant whose layout was used instead
        fallback: FormatVariant,
    },

    /// The section only fit an older layout than the header declared
    #[error("section decoded with {used} layout instead of declared {declared}")]
    LayoutFallback {
        /// Variant the header declared
        declared: FormatVariant,
        /// Variant that fit the section exactly
        used: FormatVariant,
    },

    /// The section ended in the middle of a record
    #[error("section truncated after {records} complete records ({dangling} bytes dropped)")]
    TruncatedSection {
        /// Records fully decoded before the cut
        records: usize,
        /// Bytes of the partial record that were discarded
        dangling: usize,
    },

    /// An optional section failed and was dropped
    #[error("section dropped: {cause}")]
    SectionAbsent {
        /// The failure that caused it
        cause: DecodeError,
    },

    /// A self-delimiting section had bytes left after its last field
    #[error("{count} unread bytes at end of section")]
    TrailingBytes {
        /// Unread byte count
        count: usize,
    },

    /// One frame entry could not be read and was skipped
    #[error("frame {frame}: entry skipped: {cause}")]
    MalformedEntry {
        /// Index of the frame holding the entry
        frame: usize,
        /// The failure
        cause: DecodeError,
    },

    /// A frame's timestamp is lower than the previous frame's
    #[error("frame {frame}: timestamp {current} precedes {previous}")]
    NonMonotonicTimestamp {
        /// Index of the offending frame
        frame: usize,
        /// Previous frame's timestamp
        previous: f32,
        /// This frame's timestamp
        current: f32,
    },

    /// Decoding stopped at the configured frame limit
    #[error("frame limit of {limit} reached")]
    FrameLimitReached {
        /// The configured limit
        limit: usize,
    },

    /// Trailer frame count differs from the frames decoded
    #[error("trailer declares {declared} frames, decoded {decoded}")]
    FrameCountMismatch {
        /// Count from the trailer
        declared: u32,
        /// Count actually decoded
        decoded: usize,
    },

    /// Trailer entry count differs from the entries decoded
    #[error("trailer declares {declared} entries, decoded {decoded}")]
    EntryCountMismatch {
        /// Count from the trailer
        declared: u32,
        /// Count actually decoded
        decoded: usize,
    },

    /// Frame section bytes do not match the trailer checksum
    #[error("frame checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// CRC32 stored in the trailer
        expected: u32,
        /// CRC32 computed over the frame section
        actual: u32,
    },

    /// Telemetry refers to a slot the roster does not have
    #[error("slot {slot} has telemetry but no roster entry (first seen in frame {frame})")]
    SlotOutsideRoster {
        /// The slot number
        slot: u8,
        /// First frame it appeared in
        frame: usize,
    },

    /// A section table entry beyond what the variant defines
    #[error("section table entry {index} not recognized, skipped")]
    UnrecognizedSection {
        /// Table index
        index: usize,
    },
}

/// A warning collected during decoding
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Section the condition belongs to, `None` for the header
    pub section: Option<SectionKind>,
    /// Absolute byte offset where it was detected
    pub offset: usize,
    /// The condition
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Diagnostic for a section
    #[must_use]
    pub fn section(section: SectionKind, offset: usize, kind: DiagnosticKind) -> Self {
        Self {
            section: Some(section),
            offset,
            kind,
        }
    }

    /// Diagnostic for the file header
    #[must_use]
    pub fn header(offset: usize, kind: DiagnosticKind) -> Self {
        Self {
            section: None,
            offset,
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Some(section) => write!(f, "[{section} @ {}] {}", self.offset, self.kind),
            None => write!(f, "[header @ {}] {}", self.offset, self.kind),
        }
    }
}
