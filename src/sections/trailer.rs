//! Trailer section

use tracing::debug;

use super::{decode_exact, Outcome, SectionContext, SectionDecoder};
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::format::layout::{read_record, Encoding, FieldSpec, Layout, LayoutField};
use crate::format::{FormatVariant, SectionKind};
use crate::model::Trailer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FrameCount,
    EntryCount,
    TimeStart,
    TimeEnd,
    FramesCrc,
}

impl LayoutField for Field {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        self as usize
    }
}

static TRAILER_V2: Layout<Field> = Layout {
    name: "trailer v2",
    fields: &[
        FieldSpec::new(Field::FrameCount, Encoding::U32),
        FieldSpec::new(Field::EntryCount, Encoding::U32),
        FieldSpec::new(Field::TimeStart, Encoding::F32),
        FieldSpec::new(Field::TimeEnd, Encoding::F32),
    ],
};

static TRAILER_V3: Layout<Field> = Layout {
    name: "trailer v3",
    fields: &[
        FieldSpec::new(Field::FrameCount, Encoding::U32),
        FieldSpec::new(Field::EntryCount, Encoding::U32),
        FieldSpec::new(Field::TimeStart, Encoding::F32),
        FieldSpec::new(Field::TimeEnd, Encoding::F32),
        FieldSpec::new(Field::FramesCrc, Encoding::U32),
    ],
};

/// Decodes the trailer section
///
/// V1 files have no trailer; a V1 layout request reads the V2 shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailerDecoder;

impl TrailerDecoder {
    /// Read the trailer with a specific variant's layout
    ///
    /// # Errors
    ///
    /// Propagates cursor failures
    pub fn decode_variant(
        cursor: &mut ByteCursor<'_>,
        variant: FormatVariant,
    ) -> Result<Trailer, DecodeError> {
        let layout = match variant.layout() {
            FormatVariant::V1 | FormatVariant::V2 => &TRAILER_V2,
            _ => &TRAILER_V3,
        };
        let record = read_record(cursor, layout)?;

        Ok(Trailer {
            frame_count: record.u32(Field::FrameCount).unwrap_or_default(),
            entry_count: record.u32(Field::EntryCount).unwrap_or_default(),
            time_start: record.float(Field::TimeStart).unwrap_or_default(),
            time_end: record.float(Field::TimeEnd).unwrap_or_default(),
            frames_crc32: record.u32(Field::FramesCrc),
        })
    }
}

impl SectionDecoder for TrailerDecoder {
    type Output = Option<Trailer>;

    const KIND: SectionKind = SectionKind::Trailer;

    fn decode(
        &self,
        cursor: &mut ByteCursor<'_>,
        ctx: &SectionContext<'_>,
    ) -> Result<Outcome<Self::Output>, DecodeError> {
        if cursor.is_empty() {
            return Ok(Outcome::clean(None));
        }

        let outcome = decode_exact(Self::KIND, cursor, ctx, Self::decode_variant)?;
        debug!(
            "Trailer: {} frames, {} entries, {}s..{}s",
            outcome.value.frame_count,
            outcome.value.entry_count,
            outcome.value.time_start,
            outcome.value.time_end
        );
        Ok(outcome.map(Some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use crate::model::DiagnosticKind;

    fn v2_trailer() -> Vec<u8> {
        let mut data = 120u32.to_le_bytes().to_vec();
        data.extend_from_slice(&2400u32.to_le_bytes());
        data.extend_from_slice(&0.0f32.to_le_bytes());
        data.extend_from_slice(&59.5f32.to_le_bytes());
        data
    }

    fn decode(data: &[u8], variant: FormatVariant) -> Outcome<Option<Trailer>> {
        let config = DecoderConfig::default();
        let ctx = SectionContext::new(variant, &config);
        TrailerDecoder
            .decode(&mut ByteCursor::new(data), &ctx)
            .unwrap()
    }

    #[test]
    fn test_v2_trailer() {
        let outcome = decode(&v2_trailer(), FormatVariant::V2);
        assert!(outcome.diagnostics.is_empty());

        let trailer = outcome.value.unwrap();
        assert_eq!(trailer.frame_count, 120);
        assert_eq!(trailer.entry_count, 2400);
        assert_eq!(trailer.duration(), 59.5);
        assert_eq!(trailer.frames_crc32, None);
    }

    #[test]
    fn test_v3_trailer_has_checksum() {
        let mut data = v2_trailer();
        data.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());

        let trailer = decode(&data, FormatVariant::V3).value.unwrap();
        assert_eq!(trailer.frames_crc32, Some(0xDEAD_BEEF));
    }

    #[test]
    fn test_v3_header_over_v2_trailer() {
        let outcome = decode(&v2_trailer(), FormatVariant::V3);
        assert_eq!(outcome.value.unwrap().frames_crc32, None);
        assert!(matches!(
            outcome.diagnostics[0].kind,
            DiagnosticKind::LayoutFallback { used: FormatVariant::V2, .. }
        ));
    }

    #[test]
    fn test_empty_trailer_is_absent() {
        let outcome = decode(&[], FormatVariant::V2);
        assert!(outcome.value.is_none());
        assert!(outcome.diagnostics.is_empty());
    }
}
