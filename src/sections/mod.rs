//! Section decoders
//!
//! Every decoder receives a cursor scoped to exactly its section's declared
//! range plus the header's variant, and never looks at any other section.

mod events;
mod frames;
mod roster;
mod session;
mod trailer;

pub use frames::{telemetry_size, FrameBlock, FrameBlockDecoder, ENTRY_HEADER_SIZE};
pub use roster::RosterDecoder;
pub use session::SessionInfoDecoder;
pub use trailer::TrailerDecoder;

use tracing::warn;

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::format::{FormatVariant, SectionKind};
use crate::model::{Diagnostic, DiagnosticKind};

/// A decoded value plus the warnings collected while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// The value
    pub value: T,
    /// Recoverable conditions met on the way
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    /// A value with no warnings
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Transform the value, keeping the warnings
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

/// What a section decoder knows about the file
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    /// Variant declared by the header
    pub variant: FormatVariant,
    /// Decoder configuration
    pub config: &'a DecoderConfig,
}

impl<'a> SectionContext<'a> {
    /// Context for a variant
    #[must_use]
    pub fn new(variant: FormatVariant, config: &'a DecoderConfig) -> Self {
        Self { variant, config }
    }
}

/// Common contract of the section decoders
pub trait SectionDecoder {
    /// Decoded section value
    type Output;

    /// Section this decoder reads
    const KIND: SectionKind;

    /// Decode a whole section
    ///
    /// `cursor` covers exactly the section's declared bytes.
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable failure; recoverable ones are
    /// reported in the outcome's diagnostics
    fn decode(
        &self,
        cursor: &mut ByteCursor<'_>,
        ctx: &SectionContext<'_>,
    ) -> Result<Outcome<Self::Output>, DecodeError>;
}

/// Decode a section that must consume its declared length exactly
///
/// The declared variant's layout is tried first. If it fails or leaves
/// bytes over, older layouts are tried and the first exact fit wins with a
/// `LayoutFallback` warning. With no exact fit the declared attempt stands:
/// its error, or its value with a `TrailingBytes` warning.
pub(crate) fn decode_exact<T>(
    kind: SectionKind,
    cursor: &mut ByteCursor<'_>,
    ctx: &SectionContext<'_>,
    decode_as: impl Fn(&mut ByteCursor<'_>, FormatVariant) -> Result<T, DecodeError>,
) -> Result<Outcome<T>, DecodeError> {
    *cursor = cursor.with_length_limit(ctx.config.limits.max_string_len);
    let declared = ctx.variant.layout();
    let mut attempt = *cursor;

    let declared_result = decode_as(&mut attempt, declared);
    if declared_result.is_ok() && attempt.at_end() {
        *cursor = attempt;
        return declared_result.map(Outcome::clean);
    }

    if ctx.config.layout_fallback {
        for candidate in declared.older() {
            let mut retry = *cursor;
            if let Ok(value) = decode_as(&mut retry, candidate) {
                if retry.at_end() {
                    warn!(
                        "{} section matches the {} layout, not the declared {}",
                        kind, candidate, declared
                    );
                    let diagnostic = Diagnostic::section(
                        kind,
                        cursor.base(),
                        DiagnosticKind::LayoutFallback {
                            declared,
                            used: candidate,
                        },
                    );
                    *cursor = retry;
                    return Ok(Outcome {
                        value,
                        diagnostics: vec![diagnostic],
                    });
                }
            }
        }
    }

    let value = declared_result?;
    let count = attempt.remaining();
    warn!("{} section has {} trailing bytes", kind, count);
    let diagnostic = Diagnostic::section(
        kind,
        attempt.absolute_position(),
        DiagnosticKind::TrailingBytes { count },
    );
    attempt.read_rest();
    *cursor = attempt;

    Ok(Outcome {
        value,
        diagnostics: vec![diagnostic],
    })
}
