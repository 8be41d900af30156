//! Event entry payloads

use bytes::Bytes;

use super::frames::EntryHeader;
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::model::{EventKind, PitLaneAction, ReplayEvent};

/// Standings block prefix skipped before the running order
const OVERTAKE_PREFIX: usize = 21;

/// Decode a non-telemetry entry
///
/// `payload` covers exactly the entry's declared size. Unrecognized
/// class/type pairs keep their bytes.
pub(crate) fn decode_event(
    header: EntryHeader,
    payload: &mut ByteCursor<'_>,
) -> Result<ReplayEvent, DecodeError> {
    let kind = match (header.class, header.kind) {
        (1, 10) => EventKind::StartLights {
            state: payload.read_u8()?,
        },
        (1, 7) => EventKind::Garage {
            timestamp: payload.read_f32()?,
        },
        (3, 6) => {
            let lap_or_sector_time = payload.read_f32()?;
            let timestamp = payload.read_f32()?;
            let lap = payload.read_u8()?;
            let sector = (payload.read_u8()? >> 6) & 0x03;
            EventKind::Checkpoint {
                lap_or_sector_time,
                timestamp,
                lap,
                sector,
            }
        }
        (5, 2) => EventKind::PitLane {
            action: PitLaneAction::from_code(payload.read_u8()?),
        },
        (3, 48) => {
            payload.skip(OVERTAKE_PREFIX)?;
            EventKind::Overtake {
                standings: Bytes::copy_from_slice(payload.read_rest()),
            }
        }
        (class, kind) => EventKind::Unknown {
            class,
            kind,
            payload: Bytes::copy_from_slice(payload.read_rest()),
        },
    };

    Ok(ReplayEvent {
        slot: header.slot(),
        kind,
    })
}
