//! On-disk format constants, variants, and raw header structures

pub mod layout;

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Magic signature at offset 0
pub const VCR_MAGIC: [u8; 4] = *b"RCV\0";

/// Magic + version
pub const PREAMBLE_SIZE: usize = 8;

/// One `(offset, length)` pair in the section table
pub const SECTION_ENTRY_SIZE: usize = 8;

/// Smallest possible header: preamble plus one section entry
pub const MIN_HEADER_SIZE: usize = PREAMBLE_SIZE + SECTION_ENTRY_SIZE;

/// First bytes of a gzip stream; some tools ship replays compressed
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Slot value meaning "no driver"
pub const NO_SLOT: u8 = 0xFF;

/// Fixed preamble (8 bytes)
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct RawPreamble {
    /// Magic bytes for file format identification
    pub magic: [u8; 4],
    /// Format version, little-endian
    pub version: [u8; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<RawPreamble>(), PREAMBLE_SIZE);

/// Section table entry (8 bytes)
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct RawSectionEntry {
    /// Absolute offset of the section, little-endian
    pub offset: [u8; 4],
    /// Section length in bytes, little-endian
    pub length: [u8; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<RawSectionEntry>(), SECTION_ENTRY_SIZE);

impl RawPreamble {
    /// Version as a native integer
    #[must_use]
    pub fn version(&self) -> u32 {
        u32::from_le_bytes(self.version)
    }
}

impl RawSectionEntry {
    /// Offset as a native integer
    #[must_use]
    pub fn offset(&self) -> u32 {
        u32::from_le_bytes(self.offset)
    }

    /// Length as a native integer
    #[must_use]
    pub fn length(&self) -> u32 {
        u32::from_le_bytes(self.length)
    }
}

/// Byte-layout convention selected by the header's version field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVariant {
    /// Version 1
    V1,
    /// Version 2: adds trailer, richer roster and session
    V2,
    /// Version 3: adds velocity, lap timing, weather, frame checksum
    V3,
    /// Any other version; decoded with the closest lower known layout
    Unknown(u32),
}

const V1_SECTIONS: &[SectionKind] = &[
    SectionKind::Roster,
    SectionKind::SessionInfo,
    SectionKind::Frames,
];

const V2_SECTIONS: &[SectionKind] = &[
    SectionKind::Roster,
    SectionKind::SessionInfo,
    SectionKind::Frames,
    SectionKind::Trailer,
];

impl FormatVariant {
    /// Known variants, oldest first
    pub const KNOWN: [Self; 3] = [Self::V1, Self::V2, Self::V3];

    /// Map a raw version number
    #[must_use]
    pub fn from_version(version: u32) -> Self {
        match version {
            1 => Self::V1,
            2 => Self::V2,
            3 => Self::V3,
            other => Self::Unknown(other),
        }
    }

    /// Raw version number
    #[must_use]
    pub fn version(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::Unknown(v) => v,
        }
    }

    /// True for V1, V2 and V3
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// The known variant whose layout is used to read this one
    ///
    /// Unknown versions above the newest known one read as the newest;
    /// version 0 has no lower neighbour and reads as V1.
    #[must_use]
    pub fn layout(self) -> Self {
        match self {
            Self::Unknown(v) if v > 3 => Self::V3,
            Self::Unknown(_) => Self::V1,
            known => known,
        }
    }

    /// Known variants older than this one's layout, newest first
    pub fn older(self) -> impl Iterator<Item = Self> {
        let rank = self.layout().version();
        Self::KNOWN
            .into_iter()
            .rev()
            .filter(move |v| v.version() < rank)
    }

    /// Which section each table index denotes
    #[must_use]
    pub fn section_kinds(self) -> &'static [SectionKind] {
        match self.layout() {
            Self::V1 => V1_SECTIONS,
            _ => V2_SECTIONS,
        }
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "unknown (v{v})"),
            known => write!(f, "V{}", known.version()),
        }
    }
}

/// Logical section categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Participant roster
    Roster,
    /// Session and track metadata
    SessionInfo,
    /// Per-frame telemetry and events
    Frames,
    /// End-of-file summary
    Trailer,
}

impl SectionKind {
    /// A failure in a mandatory section aborts the whole decode
    #[must_use]
    pub fn is_mandatory(self) -> bool {
        matches!(self, Self::Roster)
    }

    /// Short lowercase name for logs
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Roster => "roster",
            Self::SessionInfo => "session",
            Self::Frames => "frames",
            Self::Trailer => "trailer",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
