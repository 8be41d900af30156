//! File header and section table

use std::ops::Range;

use tracing::{debug, warn};

use crate::config::UnknownVersionPolicy;
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::format::{
    FormatVariant, RawPreamble, RawSectionEntry, SectionKind, GZIP_MAGIC, MIN_HEADER_SIZE,
    PREAMBLE_SIZE, SECTION_ENTRY_SIZE, VCR_MAGIC,
};
use crate::model::{Diagnostic, DiagnosticKind};
use crate::sections::Outcome;

/// One validated section table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    /// Position in the table
    pub index: usize,
    /// What the variant says lives here, `None` past the known table
    pub kind: Option<SectionKind>,
    /// Absolute offset
    pub offset: u32,
    /// Length in bytes
    pub length: u32,
}

impl SectionEntry {
    /// Byte range inside the file
    ///
    /// Saturates instead of wrapping; a decoded header never holds an
    /// entry whose end overflows.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start.saturating_add(self.length as usize)
    }

    /// Absolute offset of this entry inside the section table
    #[must_use]
    pub fn table_offset(&self) -> usize {
        PREAMBLE_SIZE + self.index * SECTION_ENTRY_SIZE
    }
}

/// Decoded file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes, always [`VCR_MAGIC`] once decoded
    pub magic: [u8; 4],
    /// Raw version number
    pub version: u32,
    /// Variant selected from the version
    pub variant: FormatVariant,
    /// Section table in file order
    pub sections: Vec<SectionEntry>,
}

impl FileHeader {
    /// Table entry for a section kind, if the file declares it
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&SectionEntry> {
        self.sections.iter().find(|entry| entry.kind == Some(kind))
    }

    /// Present when the version is unknown and a fallback layout is in use
    #[must_use]
    pub fn compatibility_warning(&self) -> Option<String> {
        match self.variant {
            FormatVariant::Unknown(version) => Some(format!(
                "format version {version} is not recognized; decoded with the {} layout",
                self.variant.layout()
            )),
            _ => None,
        }
    }

    /// Length of the preamble plus section table
    #[must_use]
    pub fn size(&self) -> usize {
        PREAMBLE_SIZE + self.sections.len() * SECTION_ENTRY_SIZE
    }
}

/// Reads the preamble and section table
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder {
    policy: UnknownVersionPolicy,
}

impl HeaderDecoder {
    /// Create a header decoder with an unknown-version policy
    #[must_use]
    pub fn new(policy: UnknownVersionPolicy) -> Self {
        Self { policy }
    }

    /// Decode the header from a cursor over the whole file, positioned at 0
    ///
    /// # Errors
    ///
    /// `UnrecognizedFormat` for a missing or wrong magic, `OutOfBounds` if
    /// the buffer ends inside the preamble or first table entry,
    /// `MalformedHeader` for an inconsistent table, and `UnknownVersion`
    /// under the reject policy
    pub fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Outcome<FileHeader>, DecodeError> {
        let file_len = cursor.len();
        let mut diagnostics = Vec::new();

        if cursor.remaining() < VCR_MAGIC.len() {
            return Err(DecodeError::UnrecognizedFormat {
                found: cursor.read_rest().to_vec(),
            });
        }

        if cursor.remaining() < PREAMBLE_SIZE {
            let magic: [u8; 4] = cursor.read_array()?;
            check_magic(magic)?;
            cursor.read_u32()?;
        }

        let preamble: RawPreamble = cursor.read_pod()?;
        check_magic(preamble.magic)?;

        let version = preamble.version();
        let variant = FormatVariant::from_version(version);
        if !variant.is_known() {
            if self.policy == UnknownVersionPolicy::Reject {
                return Err(DecodeError::UnknownVersion { version });
            }
            let fallback = variant.layout();
            warn!("Unknown replay version {}, reading as {}", version, fallback);
            diagnostics.push(Diagnostic::header(
                4,
                DiagnosticKind::UnknownVersion { version, fallback },
            ));
        }

        let first: RawSectionEntry = cursor.read_pod()?;
        let table_end = first.offset() as usize;
        if table_end < MIN_HEADER_SIZE || (table_end - PREAMBLE_SIZE) % SECTION_ENTRY_SIZE != 0 {
            return Err(DecodeError::malformed_header(
                PREAMBLE_SIZE,
                format!("first section offset {table_end} does not close a section table"),
            ));
        }
        if table_end > file_len {
            return Err(DecodeError::malformed_header(
                PREAMBLE_SIZE,
                format!("section table ends at {table_end}, past the {file_len}-byte file"),
            ));
        }

        let count = (table_end - PREAMBLE_SIZE) / SECTION_ENTRY_SIZE;
        let kinds = variant.section_kinds();
        if variant.is_known() && count > kinds.len() {
            return Err(DecodeError::malformed_header(
                PREAMBLE_SIZE,
                format!(
                    "{count} section entries, {variant} defines {}",
                    kinds.len()
                ),
            ));
        }

        let mut sections = Vec::with_capacity(count);
        let mut prev_end = table_end;
        let mut raw = first;

        for index in 0..count {
            if index > 0 {
                raw = cursor.read_pod()?;
            }

            let entry = SectionEntry {
                index,
                kind: kinds.get(index).copied(),
                offset: raw.offset(),
                length: raw.length(),
            };
            validate_entry(&entry, prev_end, file_len)?;
            prev_end = entry.range().end;

            if entry.kind.is_none() {
                diagnostics.push(Diagnostic::header(
                    entry.table_offset(),
                    DiagnosticKind::UnrecognizedSection { index },
                ));
            }

            debug!(
                "Section {} ({}): {} bytes at {}",
                index,
                entry.kind.map_or("unrecognized", SectionKind::name),
                entry.length,
                entry.offset
            );
            sections.push(entry);
        }

        Ok(Outcome {
            value: FileHeader {
                magic: preamble.magic,
                version,
                variant,
                sections,
            },
            diagnostics,
        })
    }
}

fn check_magic(magic: [u8; 4]) -> Result<(), DecodeError> {
    if magic == VCR_MAGIC {
        return Ok(());
    }
    if magic[..2] == GZIP_MAGIC {
        debug!("Input is gzip-compressed; decompress before decoding");
    }
    Err(DecodeError::UnrecognizedFormat {
        found: magic.to_vec(),
    })
}

fn validate_entry(entry: &SectionEntry, prev_end: usize, file_len: usize) -> Result<(), DecodeError> {
    let start = entry.offset as usize;
    let end = start.checked_add(entry.length as usize).ok_or_else(|| {
        DecodeError::malformed_header(
            entry.table_offset(),
            format!(
                "section {} length {} overflows from offset {start}",
                entry.index, entry.length
            ),
        )
    })?;

    if end > file_len {
        return Err(DecodeError::malformed_header(
            entry.table_offset(),
            format!(
                "section {} spans {start}..{end}, past the {file_len}-byte file",
                entry.index
            ),
        ));
    }

    if start < prev_end {
        return Err(DecodeError::malformed_header(
            entry.table_offset(),
            format!(
                "section {} starts at {start}, inside the previous region ending at {prev_end}",
                entry.index
            ),
        ));
    }

    Ok(())
}
