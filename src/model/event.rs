//! Discrete race events recorded between telemetry samples

use bytes::Bytes;

/// Pit lane action codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitLaneAction {
    /// Leaving the garage (code 0, meaning partly guessed)
    GarageExit,
    /// Entering the garage (code 1, meaning partly guessed)
    GarageEnter,
    /// Left the pit lane or pit limiter off
    PitExit,
    /// Pit stop requested
    PitRequest,
    /// Entered the pit lane or pit limiter on
    PitEntry,
    /// Stopped in the pit box, car on jacks
    BoxEnter,
    /// Left the pit box, car off jacks
    BoxExit,
    /// Any other code
    Other(u8),
}

impl PitLaneAction {
    /// Map a raw action code
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::GarageExit,
            1 => Self::GarageEnter,
            32 => Self::PitExit,
            33 => Self::PitRequest,
            34 => Self::PitEntry,
            35 => Self::BoxEnter,
            36 => Self::BoxExit,
            other => Self::Other(other),
        }
    }

    /// Raw action code
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::GarageExit => 0,
            Self::GarageEnter => 1,
            Self::PitExit => 32,
            Self::PitRequest => 33,
            Self::PitEntry => 34,
            Self::BoxEnter => 35,
            Self::BoxExit => 36,
            Self::Other(code) => code,
        }
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Start light state change
    StartLights {
        /// Light state
        state: u8,
    },
    /// Car entered or left the garage
    Garage {
        /// Session time carried in the payload
        timestamp: f32,
    },
    /// Sector or lap completed
    Checkpoint {
        /// Sector time, or lap time at the line
        lap_or_sector_time: f32,
        /// Session time carried in the payload
        timestamp: f32,
        /// Lap number
        lap: u8,
        /// Sector 0..=3
        sector: u8,
    },
    /// Pit lane activity
    PitLane {
        /// What happened
        action: PitLaneAction,
    },
    /// Running order change
    Overtake {
        /// Raw standings block
        standings: Bytes,
    },
    /// Entry type with no known decoding
    Unknown {
        /// Entry class (3 bits)
        class: u8,
        /// Entry type (6 bits)
        kind: u8,
        /// Raw payload
        payload: Bytes,
    },
}

/// One event entry
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    /// Slot the event concerns, `None` for session-wide events
    pub slot: Option<u8>,
    /// Payload
    pub kind: EventKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pit_codes() {
        for code in [0u8, 1, 32, 33, 34, 35, 36, 99] {
            assert_eq!(PitLaneAction::from_code(code).code(), code);
        }
        assert_eq!(PitLaneAction::from_code(34), PitLaneAction::PitEntry);
        assert_eq!(PitLaneAction::from_code(7), PitLaneAction::Other(7));
    }
}
