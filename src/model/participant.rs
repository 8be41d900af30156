//! Static per-driver identity

/// One roster entry
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Roster position, also the slot number used by frame entries
    pub slot: u8,
    /// Car number
    pub number: u8,
    /// Driver name
    pub name: String,
    /// Co-driver name (V2+)
    pub codriver: Option<String>,
    /// Team name (V2+)
    pub team: Option<String>,
    /// Vehicle model name
    pub vehicle: String,
    /// Vehicle class (V2+)
    pub vehicle_class: Option<String>,
    /// Vehicle package version (V3)
    pub vehicle_version: Option<String>,
    /// Vehicle package unique id (V3)
    pub vehicle_uid: Option<String>,
    /// Vehicle definition file
    pub vehicle_file: String,
    /// Grid position (V2+)
    pub start_position: Option<u8>,
    /// Session time the car left the garage
    pub time_enter: f32,
    /// Session time the car returned or retired
    pub time_exit: f32,
}

impl Participant {
    /// True if the car was out at `time`
    #[must_use]
    pub fn on_track_at(&self, time: f32) -> bool {
        time >= self.time_enter && time <= self.time_exit
    }
}
