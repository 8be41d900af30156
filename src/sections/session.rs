//! Session info section

use tracing::debug;

use super::{decode_exact, Outcome, SectionContext, SectionDecoder};
use crate::cursor::{ByteCursor, PrefixWidth};
use crate::error::DecodeError;
use crate::format::layout::{read_record, Encoding, FieldSpec, Layout, LayoutField};
use crate::format::{FormatVariant, SectionKind};
use crate::model::{SessionInfo, SessionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Rfm,
    ModInfo,
    Scene,
    Aiw,
    ModName,
    ModVersion,
    ModUid,
    TrackPath,
    Flags,
    AmbientTemp,
    TrackTemp,
    RecordedAt,
    Rain,
    Wetness,
}

impl LayoutField for Field {
    const COUNT: usize = 14;

    fn index(self) -> usize {
        self as usize
    }
}

const P2: Encoding = Encoding::Prefixed(PrefixWidth::Two);
const P4: Encoding = Encoding::Prefixed(PrefixWidth::Four);

static SESSION_V1: Layout<Field> = Layout {
    name: "session v1",
    fields: &[
        FieldSpec::new(Field::Rfm, P4),
        FieldSpec::new(Field::Scene, P4),
        FieldSpec::new(Field::Aiw, P4),
        FieldSpec::new(Field::Flags, Encoding::U8),
    ],
};

static SESSION_V2: Layout<Field> = Layout {
    name: "session v2",
    fields: &[
        FieldSpec::new(Field::Rfm, P4),
        FieldSpec::new(Field::ModInfo, P4),
        FieldSpec::new(Field::Scene, P4),
        FieldSpec::new(Field::Aiw, P4),
        FieldSpec::new(Field::ModName, P2),
        FieldSpec::new(Field::ModVersion, P2),
        FieldSpec::new(Field::ModUid, P2),
        FieldSpec::new(Field::TrackPath, P2),
        FieldSpec::new(Field::Flags, Encoding::U8),
        FieldSpec::new(Field::AmbientTemp, Encoding::F32),
        FieldSpec::new(Field::TrackTemp, Encoding::F32),
        FieldSpec::new(Field::RecordedAt, Encoding::U32),
    ],
};

static SESSION_V3: Layout<Field> = Layout {
    name: "session v3",
    fields: &[
        FieldSpec::new(Field::Rfm, P4),
        FieldSpec::new(Field::ModInfo, P4),
        FieldSpec::new(Field::Scene, P4),
        FieldSpec::new(Field::Aiw, P4),
        FieldSpec::new(Field::ModName, P2),
        FieldSpec::new(Field::ModVersion, P2),
        FieldSpec::new(Field::ModUid, P2),
        FieldSpec::new(Field::TrackPath, P2),
        FieldSpec::new(Field::Flags, Encoding::U8),
        FieldSpec::new(Field::AmbientTemp, Encoding::F32),
        FieldSpec::new(Field::TrackTemp, Encoding::F32),
        FieldSpec::new(Field::RecordedAt, Encoding::U32),
        FieldSpec::new(Field::Rain, Encoding::F32),
        FieldSpec::new(Field::Wetness, Encoding::F32),
    ],
};

fn layout(variant: FormatVariant) -> &'static Layout<Field> {
    match variant.layout() {
        FormatVariant::V1 => &SESSION_V1,
        FormatVariant::V2 => &SESSION_V2,
        _ => &SESSION_V3,
    }
}

/// Decodes the session info section
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionInfoDecoder;

impl SessionInfoDecoder {
    /// Read one session record with a specific variant's layout
    ///
    /// # Errors
    ///
    /// Propagates cursor failures
    pub fn decode_variant(
        cursor: &mut ByteCursor<'_>,
        variant: FormatVariant,
    ) -> Result<SessionInfo, DecodeError> {
        let mut record = read_record(cursor, layout(variant))?;
        let (session_type, private_session) =
            SessionType::from_flags(record.u8(Field::Flags).unwrap_or_default());

        Ok(SessionInfo {
            rfm: record.take_text(Field::Rfm).unwrap_or_default(),
            track: record.take_text(Field::Scene).unwrap_or_default(),
            aiw_file: record.take_text(Field::Aiw).unwrap_or_default(),
            session_type,
            private_session,
            mod_info: record.take_text(Field::ModInfo),
            mod_name: record.take_text(Field::ModName),
            mod_version: record.take_text(Field::ModVersion),
            mod_uid: record.take_text(Field::ModUid),
            track_path: record.take_text(Field::TrackPath),
            ambient_temp: record.float(Field::AmbientTemp),
            track_temp: record.float(Field::TrackTemp),
            recorded_at: record.u32(Field::RecordedAt),
            rain: record.float(Field::Rain),
            wetness: record.float(Field::Wetness),
        })
    }
}

impl SectionDecoder for SessionInfoDecoder {
    type Output = Option<SessionInfo>;

    const KIND: SectionKind = SectionKind::SessionInfo;

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
            "Session: {} at {} ({})",
            outcome.value.session_type, outcome.value.track, outcome.value.rfm
        );
        Ok(outcome.map(Some))
    }
}
