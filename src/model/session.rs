//! Session and track metadata

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Kind of session, decoded from the low nibble of the session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    /// Test day
    TestDay,
    /// Practice session 1..=4
    Practice(u8),
    /// Qualifying session 1..=4
    Qualifying(u8),
    /// Warmup
    Warmup,
    /// Race 1..=4
    Race(u8),
    /// Nibble value outside the known range
    Unknown(u8),
}

impl SessionType {
    /// Decode the session flags byte into type and private-session bit
    #[must_use]
    pub fn from_flags(flags: u8) -> (Self, bool) {
        let number = flags & 0x0F;
        let session = match number {
            0 => Self::TestDay,
            1..=4 => Self::Practice(number),
            5..=8 => Self::Qualifying(number - 4),
            9 => Self::Warmup,
            10..=13 => Self::Race(number - 9),
            other => Self::Unknown(other),
        };
        (session, flags & 0x80 != 0)
    }

    /// True for any race session
    #[must_use]
    pub fn is_race(self) -> bool {
        matches!(self, Self::Race(_))
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestDay => f.write_str("Test Day"),
            Self::Practice(n) => write!(f, "Practice {n}"),
            Self::Qualifying(n) => write!(f, "Qualifying {n}"),
            Self::Warmup => f.write_str("Warmup"),
            Self::Race(n) => write!(f, "Race {n}"),
            Self::Unknown(n) => write!(f, "Unknown session ({n})"),
        }
    }
}

/// Session-level metadata
///
/// `Option` fields are absent from older format variants.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    /// rFactor mod definition file
    pub rfm: String,
    /// Track identifier (scene file)
    pub track: String,
    /// AI waypoint file
    pub aiw_file: String,
    /// Session kind and number
    pub session_type: SessionType,
    /// Private session flag
    pub private_session: bool,
    /// Mod description
    pub mod_info: Option<String>,
    /// Mod package name
    pub mod_name: Option<String>,
    /// Mod package version
    pub mod_version: Option<String>,
    /// Mod package unique id
    pub mod_uid: Option<String>,
    /// Track location inside the install
    pub track_path: Option<String>,
    /// Ambient temperature as stored
    pub ambient_temp: Option<f32>,
    /// Track surface temperature as stored
    pub track_temp: Option<f32>,
    /// Recording start, unix seconds
    pub recorded_at: Option<u32>,
    /// Rain intensity as stored
    pub rain: Option<f32>,
    /// Track wetness as stored
    pub wetness: Option<f32>,
}

impl SessionInfo {
    /// Recording start as a wall-clock time
    #[must_use]
    pub fn recording_start(&self) -> Option<SystemTime> {
        self.recorded_at
            .map(|secs| UNIX_EPOCH + Duration::from_secs(u64::from(secs)))
    }

    /// Display name of the session, e.g. "Qualifying 1"
    #[must_use]
    pub fn session_name(&self) -> String {
        self.session_type.to_string()
    }
}
