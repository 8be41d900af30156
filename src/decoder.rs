//! Whole-file decoding: header, then sections, then cross-checks

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::fingerprint::{section_checksum, ReplayFingerprint};
use crate::format::SectionKind;
use crate::header::{FileHeader, HeaderDecoder};
use crate::model::{Diagnostic, DiagnosticKind, ModelParts, Participant, ReplayModel, SessionInfo, Trailer};
use crate::sections::{
    FrameBlock, FrameBlockDecoder, Outcome, RosterDecoder, SectionContext, SectionDecoder,
    SessionInfoDecoder, TrailerDecoder,
};

/// Offset of the checksum inside a V3 trailer
const TRAILER_CRC_OFFSET: usize = 16;

/// Decodes replay buffers into [`ReplayModel`]s
///
/// Holds only configuration; one decoder can be shared and reused.
#[derive(Debug, Clone, Default)]
pub struct ReplayDecoder {
    config: DecoderConfig,
}

impl ReplayDecoder {
    /// Create a decoder with the given configuration
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a complete replay buffer
    ///
    /// # Errors
    ///
    /// Header failures and roster failures are terminal. Everything else
    /// is reported through the model's diagnostics.
    pub fn decode(&self, buffer: &[u8]) -> Result<ReplayModel, DecodeError> {
        let header = Start { buffer }
            .decode_header(&self.config)
            .map_err(|e| {
                warn!("Replay header rejected: {}", e);
                e
            })?;
        let sections = header.decode_sections(&self.config).map_err(|e| {
            warn!("Replay roster rejected: {}", e);
            e
        })?;
        let model = sections.cross_check(&self.config).assemble();

        info!(
            "Decoded {} replay {}: {} participants, {} frames, {} diagnostics",
            model.header().variant,
            model.fingerprint().short(),
            model.roster().len(),
            model.frame_count(),
            model.diagnostics().len()
        );

        Ok(model)
    }
}

/// Decode a buffer with the default configuration
///
/// # Errors
///
/// See [`ReplayDecoder::decode`]
pub fn decode(buffer: &[u8]) -> Result<ReplayModel, DecodeError> {
    ReplayDecoder::default().decode(buffer)
}

struct Start<'a> {
    buffer: &'a [u8],
}

struct HeaderDecoded<'a> {
    buffer: &'a [u8],
    header: FileHeader,
    diagnostics: Vec<Diagnostic>,
}

struct SectionsDecoded<'a> {
    buffer: &'a [u8],
    header: FileHeader,
    session: Option<SessionInfo>,
    roster: Vec<Participant>,
    frames: FrameBlock,
    trailer: Option<Trailer>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Start<'a> {
    fn decode_header(self, config: &DecoderConfig) -> Result<HeaderDecoded<'a>, DecodeError> {
        let mut cursor = ByteCursor::new(self.buffer);
        let outcome = HeaderDecoder::new(config.unknown_version).decode(&mut cursor)?;

        debug!(
            "Header: version {} ({}), {} sections",
            outcome.value.version,
            outcome.value.variant,
            outcome.value.sections.len()
        );

        Ok(HeaderDecoded {
            buffer: self.buffer,
            header: outcome.value,
            diagnostics: outcome.diagnostics,
        })
    }
}

impl<'a> HeaderDecoded<'a> {
    /// Run one decoder over its declared section, `None` if undeclared
    fn run<D: SectionDecoder>(
        &self,
        decoder: &D,
        ctx: &SectionContext<'_>,
    ) -> Result<Option<Outcome<D::Output>>, DecodeError> {
        let Some(entry) = self.header.section(D::KIND) else {
            return Ok(None);
        };
        let mut cursor =
            ByteCursor::scoped(self.buffer, entry.offset as usize, entry.length as usize)?;
        decoder.decode(&mut cursor, ctx).map(Some)
    }

    /// Keep an optional section's value, or record why it is absent
    fn optional<T>(
        &mut self,
        kind: SectionKind,
        result: Result<Option<Outcome<T>>, DecodeError>,
    ) -> Option<T> {
        match result {
            Ok(Some(outcome)) => {
                self.diagnostics.extend(outcome.diagnostics);
                Some(outcome.value)
            }
            Ok(None) => None,
            Err(cause) => {
                warn!("Dropping {} section: {}", kind, cause);
                self.diagnostics.push(Diagnostic::section(
                    kind,
                    cause.offset(),
                    DiagnosticKind::SectionAbsent { cause },
                ));
                None
            }
        }
    }

    fn decode_sections(mut self, config: &DecoderConfig) -> Result<SectionsDecoded<'a>, DecodeError> {
        let ctx = SectionContext::new(self.header.variant, config);

        let roster = match self.run(&RosterDecoder::new(config.limits.max_participants), &ctx)? {
            Some(outcome) => {
                self.diagnostics.extend(outcome.diagnostics);
                outcome.value
            }
            None => Vec::new(),
        };

        let result = self.run(&SessionInfoDecoder, &ctx);
        let session = self.optional(SectionKind::SessionInfo, result).flatten();

        let result = self.run(&FrameBlockDecoder, &ctx);
        let frames = self.optional(SectionKind::Frames, result).unwrap_or_default();

        let result = self.run(&TrailerDecoder, &ctx);
        let trailer = self.optional(SectionKind::Trailer, result).flatten();

        Ok(SectionsDecoded {
            buffer: self.buffer,
            header: self.header,
            session,
            roster,
            frames,
            trailer,
            diagnostics: self.diagnostics,
        })
    }
}

impl<'a> SectionsDecoded<'a> {
    fn record(&mut self, kind: SectionKind, offset: usize, diagnostic: DiagnosticKind) {
        warn!("{} section: {}", kind, diagnostic);
        self.diagnostics
            .push(Diagnostic::section(kind, offset, diagnostic));
    }

    fn cross_check(mut self, config: &DecoderConfig) -> Self {
        if let Some(trailer) = self.trailer {
            self.check_trailer(trailer, config);
        }
        self.check_slots();
        self
    }

    fn check_trailer(&mut self, trailer: Trailer, config: &DecoderConfig) {
        let trailer_offset = self
            .header
            .section(SectionKind::Trailer)
            .map_or(0, |entry| entry.offset as usize);
        let frames_entry = self.header.section(SectionKind::Frames).copied();

        if frames_entry.is_some() && self.frames.complete {
            let decoded = self.frames.frames.len();
            if trailer.frame_count as usize != decoded {
                self.record(
                    SectionKind::Trailer,
                    trailer_offset,
                    DiagnosticKind::FrameCountMismatch {
                        declared: trailer.frame_count,
                        decoded,
                    },
                );
            }

            let decoded = self.frames.entries;
            if trailer.entry_count as usize != decoded {
                self.record(
                    SectionKind::Trailer,
                    trailer_offset + 4,
                    DiagnosticKind::EntryCountMismatch {
                        declared: trailer.entry_count,
                        decoded,
                    },
                );
            }
        }

        if let (Some(expected), Some(entry), true) =
            (trailer.frames_crc32, frames_entry, config.verify_checksum)
        {
            let actual = self
                .buffer
                .get(entry.range())
                .map_or(0, section_checksum);
            if actual != expected {
                self.record(
                    SectionKind::Trailer,
                    trailer_offset + TRAILER_CRC_OFFSET,
                    DiagnosticKind::ChecksumMismatch { expected, actual },
                );
            }
        }
    }

    fn check_slots(&mut self) {
        let roster_len = self.roster.len();
        let frames_offset = self
            .header
            .section(SectionKind::Frames)
            .map_or(0, |entry| entry.offset as usize);

        let mut reported = BTreeSet::new();
        let mut found = Vec::new();
        for (index, frame) in self.frames.frames.iter().enumerate() {
            for (slot, _) in frame.vehicles() {
                if usize::from(slot) >= roster_len && reported.insert(slot) {
                    found.push(DiagnosticKind::SlotOutsideRoster { slot, frame: index });
                }
            }
        }

        for diagnostic in found {
            self.record(SectionKind::Frames, frames_offset, diagnostic);
        }
    }

    fn assemble(self) -> ReplayModel {
        ReplayModel::assemble(ModelParts {
            fingerprint: ReplayFingerprint::of(self.buffer),
            header: self.header,
            session: self.session,
            roster: self.roster,
            frames: self.frames.frames,
            trailer: self.trailer,
            diagnostics: self.diagnostics,
        })
    }
}
