//! Frame block section: the telemetry and event stream

use tracing::{debug, warn};

use super::events::decode_event;
use super::{Outcome, SectionContext, SectionDecoder};
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::format::layout::{read_record, Encoding, FieldSpec, Layout, LayoutField, Record};
use crate::format::{FormatVariant, SectionKind, NO_SLOT};
use crate::model::{
    Controls, DamageState, Diagnostic, DiagnosticKind, FrameRecord, VehicleFlags, VehicleState,
};

/// Entry header: packed `u32` + one reserved byte
pub const ENTRY_HEADER_SIZE: usize = 5;

/// Unpacked entry header word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryHeader {
    /// Slot, [`NO_SLOT`] for none
    pub slot: u8,
    /// Payload length
    pub size: usize,
    /// Entry type (6 bits)
    pub kind: u8,
    /// Entry class (3 bits)
    pub class: u8,
}

impl EntryHeader {
    pub(crate) fn unpack(packed: u32) -> Self {
        Self {
            slot: (packed & 0xFF) as u8,
            size: ((packed >> 8) & 0x1FF) as usize,
            kind: ((packed >> 17) & 0x3F) as u8,
            class: (packed >> 29) as u8,
        }
    }

    /// Class 0 types 7..=16 carry vehicle telemetry
    pub(crate) fn is_telemetry(self) -> bool {
        self.class == 0 && (7..=16).contains(&self.kind)
    }

    pub(crate) fn slot(self) -> Option<u8> {
        (self.slot != NO_SLOT).then_some(self.slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Info1,
    Info2,
    Speed,
    TcBrake,
    PosX,
    PosY,
    PosZ,
    RotX,
    RotY,
    RotZ,
    VelX,
    VelY,
    VelZ,
    Lap,
    Sector,
}

impl LayoutField for Field {
    const COUNT: usize = 15;

    fn index(self) -> usize {
        self as usize
    }
}

static TELEMETRY_V1: Layout<Field> = Layout {
    name: "telemetry v1",
    fields: &[
        FieldSpec::new(Field::Info1, Encoding::U32),
        FieldSpec::new(Field::Info2, Encoding::U32),
        FieldSpec::new(Field::TcBrake, Encoding::U8),
        FieldSpec::new(Field::PosX, Encoding::F32),
        FieldSpec::new(Field::PosY, Encoding::F32),
        FieldSpec::new(Field::PosZ, Encoding::F32),
        FieldSpec::new(Field::RotX, Encoding::F32),
        FieldSpec::new(Field::RotY, Encoding::F32),
        FieldSpec::new(Field::RotZ, Encoding::F32),
    ],
};

static TELEMETRY_V2: Layout<Field> = Layout {
    name: "telemetry v2",
    fields: &[
        FieldSpec::new(Field::Info1, Encoding::U32),
        FieldSpec::new(Field::Info2, Encoding::U32),
        FieldSpec::new(Field::Speed, Encoding::UInt(5)),
        FieldSpec::skip(25),
        FieldSpec::new(Field::TcBrake, Encoding::U8),
        FieldSpec::new(Field::PosX, Encoding::F32),
        FieldSpec::new(Field::PosY, Encoding::F32),
        FieldSpec::new(Field::PosZ, Encoding::F32),
        FieldSpec::new(Field::RotX, Encoding::F32),
        FieldSpec::new(Field::RotY, Encoding::F32),
        FieldSpec::new(Field::RotZ, Encoding::F32),
    ],
};

static TELEMETRY_V3: Layout<Field> = Layout {
    name: "telemetry v3",
    fields: &[
        FieldSpec::new(Field::Info1, Encoding::U32),
        FieldSpec::new(Field::Info2, Encoding::U32),
        FieldSpec::new(Field::Speed, Encoding::UInt(5)),
        FieldSpec::skip(25),
        FieldSpec::new(Field::TcBrake, Encoding::U8),
        FieldSpec::new(Field::PosX, Encoding::F32),
        FieldSpec::new(Field::PosY, Encoding::F32),
        FieldSpec::new(Field::PosZ, Encoding::F32),
        FieldSpec::new(Field::RotX, Encoding::F32),
        FieldSpec::new(Field::RotY, Encoding::F32),
        FieldSpec::new(Field::RotZ, Encoding::F32),
        FieldSpec::new(Field::VelX, Encoding::F32),
        FieldSpec::new(Field::VelY, Encoding::F32),
        FieldSpec::new(Field::VelZ, Encoding::F32),
        FieldSpec::new(Field::Lap, Encoding::U16),
        FieldSpec::new(Field::Sector, Encoding::U8),
    ],
};

fn telemetry_layout(variant: FormatVariant) -> &'static Layout<Field> {
    match variant.layout() {
        FormatVariant::V1 => &TELEMETRY_V1,
        FormatVariant::V2 => &TELEMETRY_V2,
        _ => &TELEMETRY_V3,
    }
}

/// Telemetry payload size for a variant
#[must_use]
pub fn telemetry_size(variant: FormatVariant) -> usize {
    telemetry_layout(variant).min_size()
}

fn flag(word: u32, bit: u32) -> bool {
    (word >> bit) & 1 != 0
}

fn vehicle_state(kind: u8, record: &Record<Field>) -> VehicleState {
    let info1 = record.u32(Field::Info1).unwrap_or_default();
    let info2 = record.u32(Field::Info2).unwrap_or_default();
    let tc_brake = record.u8(Field::TcBrake).unwrap_or_default();
    let vector = |x, y, z| match (record.float(x), record.float(y), record.float(z)) {
        (Some(x), Some(y), Some(z)) => Some([x, y, z]),
        _ => None,
    };

    VehicleState {
        gear: kind as i8 - 8,
        position: vector(Field::PosX, Field::PosY, Field::PosZ).unwrap_or_default(),
        orientation: vector(Field::RotX, Field::RotY, Field::RotZ).unwrap_or_default(),
        velocity: vector(Field::VelX, Field::VelY, Field::VelZ),
        controls: Controls {
            throttle: ((info1 >> 11) & 0x3F) as u8,
            brake: tc_brake & 0x3F,
            steer: (info1 & 0x7F) as u8,
        },
        engine_rpm: (info1 >> 18) as u16,
        traction_control: tc_brake >> 6,
        acceleration: (info2 >> 24) as u8,
        flags: VehicleFlags {
            in_pit: flag(info1, 17),
            horn: flag(info1, 10),
            headlights: flag(info2, 20),
            warning_light: flag(info2, 22),
            following: flag(info2, 23),
            driver_visible: flag(info2, 21),
        },
        current_driver: ((info2 >> 18) & 0x03) as u8,
        damage: DamageState(info2),
        speed_raw: record.int(Field::Speed),
        lap: record.u16(Field::Lap),
        sector: record.u8(Field::Sector),
    }
}

/// Decoded frame section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameBlock {
    /// Complete frames in recording order
    pub frames: Vec<FrameRecord>,
    /// Entries read across all kept frames, including skipped ones
    pub entries: usize,
    /// False if decoding stopped before the section end
    pub complete: bool,
}

/// Decodes the frame section
///
/// The section holds no record count. Frames are read until the cursor
/// lands exactly on the section end; a frame that would cross it is
/// discarded and reported as truncation, keeping every earlier frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameBlockDecoder;

impl FrameBlockDecoder {
    fn decode_frame(
        cursor: &mut ByteCursor<'_>,
        index: usize,
        telemetry: &Layout<Field>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(FrameRecord, usize), DecodeError> {
        let timestamp = cursor.read_f32()?;
        let count = usize::from(cursor.read_u16()?);
        let mut frame = FrameRecord::new(timestamp);

        for _ in 0..count {
            let entry_offset = cursor.absolute_position();
            let header = EntryHeader::unpack(cursor.read_u32()?);
            cursor.skip(ENTRY_HEADER_SIZE - 4)?;
            let mut payload = cursor.sub_cursor(header.size)?;

            let decoded = match header.slot() {
                Some(slot) if header.is_telemetry() => read_record(&mut payload, telemetry)
                    .map(|record| frame.set_vehicle(slot, vehicle_state(header.kind, &record))),
                _ => decode_event(header, &mut payload).map(|event| frame.push_event(event)),
            };

            if let Err(cause) = decoded {
                warn!("Frame {}: skipping entry at {}: {}", index, entry_offset, cause);
                diagnostics.push(Diagnostic::section(
                    SectionKind::Frames,
                    entry_offset,
                    DiagnosticKind::MalformedEntry {
                        frame: index,
                        cause,
                    },
                ));
            }
        }

        Ok((frame, count))
    }
}

impl SectionDecoder for FrameBlockDecoder {
    type Output = FrameBlock;

    const KIND: SectionKind = SectionKind::Frames;

    fn decode(
        &self,
        cursor: &mut ByteCursor<'_>,
        ctx: &SectionContext<'_>,
    ) -> Result<Outcome<Self::Output>, DecodeError> {
        let telemetry = telemetry_layout(ctx.variant);
        let limit = ctx.config.limits.max_frames;
        let mut block = FrameBlock {
            complete: true,
            ..FrameBlock::default()
        };
        let mut diagnostics = Vec::new();
        let mut previous: Option<f32> = None;

        while !cursor.at_end() {
            let index = block.frames.len();
            let start = cursor.position();

            if index == limit {
                warn!("Frame limit of {} reached at offset {}", limit, cursor.absolute_position());
                diagnostics.push(Diagnostic::section(
                    Self::KIND,
                    cursor.absolute_position(),
                    DiagnosticKind::FrameLimitReached { limit },
                ));
                block.complete = false;
                break;
            }

            let mut frame_diagnostics = Vec::new();
            let mut attempt = *cursor;
            match Self::decode_frame(&mut attempt, index, telemetry, &mut frame_diagnostics) {
                Ok((frame, entries)) => {
                    if let Some(prev) = previous.filter(|prev| frame.timestamp < *prev) {
                        diagnostics.push(Diagnostic::section(
                            Self::KIND,
                            cursor.absolute_position(),
                            DiagnosticKind::NonMonotonicTimestamp {
                                frame: index,
                                previous: prev,
                                current: frame.timestamp,
                            },
                        ));
                    }
                    previous = Some(frame.timestamp);
                    diagnostics.append(&mut frame_diagnostics);
                    block.entries += entries;
                    block.frames.push(frame);
                    *cursor = attempt;
                }
                Err(cause) => {
                    let dangling = cursor.len() - start;
                    warn!(
                        "Frame section truncated after {} frames: {}",
                        block.frames.len(),
                        cause
                    );
                    diagnostics.push(Diagnostic::section(
                        Self::KIND,
                        cursor.absolute_position(),
                        DiagnosticKind::TruncatedSection {
                            records: block.frames.len(),
                            dangling,
                        },
                    ));
                    cursor.read_rest();
                    block.complete = false;
                    break;
                }
            }
        }

        debug!(
            "Frames: {} frames, {} entries",
            block.frames.len(),
            block.entries
        );

        Ok(Outcome {
            value: block,
            diagnostics,
        })
    }
}
