//! Participant roster section

use tracing::debug;

use super::{decode_exact, Outcome, SectionContext, SectionDecoder};
use crate::cursor::{ByteCursor, PrefixWidth};
use crate::error::DecodeError;
use crate::format::layout::{read_record, Encoding, FieldSpec, Layout, LayoutField};
use crate::format::{FormatVariant, SectionKind};
use crate::model::Participant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Number,
    Name,
    Codriver,
    Team,
    Vehicle,
    Class,
    VehicleVersion,
    VehicleUid,
    VehicleFile,
    StartPosition,
    TimeEnter,
    TimeExit,
}

impl LayoutField for Field {
    const COUNT: usize = 12;

    fn index(self) -> usize {
        self as usize
    }
}

const P1: Encoding = Encoding::Prefixed(PrefixWidth::One);
const P2: Encoding = Encoding::Prefixed(PrefixWidth::Two);
const VEHICLE_FILE: Encoding = Encoding::Fixed(32);

static ROSTER_V1: Layout<Field> = Layout {
    name: "participant v1",
    fields: &[
        FieldSpec::new(Field::Number, Encoding::U8),
        FieldSpec::new(Field::Name, P1),
        FieldSpec::new(Field::Vehicle, P2),
        FieldSpec::new(Field::VehicleFile, VEHICLE_FILE),
        FieldSpec::new(Field::TimeEnter, Encoding::F32),
        FieldSpec::new(Field::TimeExit, Encoding::F32),
    ],
};

static ROSTER_V2: Layout<Field> = Layout {
    name: "participant v2",
    fields: &[
        FieldSpec::new(Field::Number, Encoding::U8),
        FieldSpec::new(Field::Name, P1),
        FieldSpec::new(Field::Codriver, P1),
        FieldSpec::new(Field::Team, P1),
        FieldSpec::new(Field::Vehicle, P2),
        FieldSpec::new(Field::Class, P2),
        FieldSpec::new(Field::VehicleFile, VEHICLE_FILE),
        FieldSpec::new(Field::StartPosition, Encoding::U8),
        FieldSpec::new(Field::TimeEnter, Encoding::F32),
        FieldSpec::new(Field::TimeExit, Encoding::F32),
    ],
};

static ROSTER_V3: Layout<Field> = Layout {
    name: "participant v3",
    fields: &[
        FieldSpec::new(Field::Number, Encoding::U8),
        FieldSpec::new(Field::Name, P1),
        FieldSpec::new(Field::Codriver, P1),
        FieldSpec::new(Field::Team, P1),
        FieldSpec::new(Field::Vehicle, P2),
        FieldSpec::new(Field::Class, P2),
        FieldSpec::new(Field::VehicleVersion, P2),
        FieldSpec::new(Field::VehicleUid, P2),
        FieldSpec::new(Field::VehicleFile, VEHICLE_FILE),
        FieldSpec::new(Field::StartPosition, Encoding::U8),
        FieldSpec::skip(48),
        FieldSpec::new(Field::TimeEnter, Encoding::F32),
        FieldSpec::new(Field::TimeExit, Encoding::F32),
    ],
};

fn layout(variant: FormatVariant) -> &'static Layout<Field> {
    match variant.layout() {
        FormatVariant::V1 => &ROSTER_V1,
        FormatVariant::V2 => &ROSTER_V2,
        _ => &ROSTER_V3,
    }
}

/// Decodes the roster section
///
/// Slots are assigned in roster order starting at 0.
#[derive(Debug, Clone, Copy)]
pub struct RosterDecoder {
    max_participants: usize,
}

impl Default for RosterDecoder {
    fn default() -> Self {
        Self {
            max_participants: usize::from(u8::MAX),
        }
    }
}

impl RosterDecoder {
    /// Decoder accepting at most `max_participants` entries
    #[must_use]
    pub fn new(max_participants: usize) -> Self {
        Self {
            max_participants: max_participants.min(usize::from(u8::MAX)),
        }
    }

    /// Read the count and every participant with one variant's layout
    ///
    /// # Errors
    ///
    /// `MalformedLength` if the count cannot fit in the remaining bytes or
    /// exceeds the participant limit; cursor failures otherwise
    pub fn decode_variant(
        &self,
        cursor: &mut ByteCursor<'_>,
        variant: FormatVariant,
    ) -> Result<Vec<Participant>, DecodeError> {
        let layout = layout(variant);
        let count_offset = cursor.absolute_position();
        let count = cursor.read_u32()? as usize;

        let allowed = (cursor.remaining() / layout.min_size()).min(self.max_participants);
        if count > allowed {
            return Err(DecodeError::MalformedLength {
                offset: count_offset,
                declared: count,
                available: allowed,
            });
        }

        let mut roster = Vec::with_capacity(count);
        for slot in 0..count {
            let mut record = read_record(cursor, layout)?;
            roster.push(Participant {
                slot: slot as u8,
                number: record.u8(Field::Number).unwrap_or_default(),
                name: record.take_text(Field::Name).unwrap_or_default(),
                codriver: record.take_text(Field::Codriver),
                team: record.take_text(Field::Team),
                vehicle: record.take_text(Field::Vehicle).unwrap_or_default(),
                vehicle_class: record.take_text(Field::Class),
                vehicle_version: record.take_text(Field::VehicleVersion),
                vehicle_uid: record.take_text(Field::VehicleUid),
                vehicle_file: record.take_text(Field::VehicleFile).unwrap_or_default(),
                start_position: record.u8(Field::StartPosition),
                time_enter: record.float(Field::TimeEnter).unwrap_or_default(),
                time_exit: record.float(Field::TimeExit).unwrap_or_default(),
            });
        }

        Ok(roster)
    }
}

impl SectionDecoder for RosterDecoder {
    type Output = Vec<Participant>;

    const KIND: SectionKind = SectionKind::Roster;

    fn decode(
        &self,
        cursor: &mut ByteCursor<'_>,
        ctx: &SectionContext<'_>,
    ) -> Result<Outcome<Self::Output>, DecodeError> {
        if cursor.is_empty() {
            return Ok(Outcome::clean(Vec::new()));
        }

        let outcome = decode_exact(Self::KIND, cursor, ctx, |c, variant| {
            self.decode_variant(c, variant)
        })?;
        debug!("Roster: {} participants", outcome.value.len());
        Ok(outcome)
    }
}
