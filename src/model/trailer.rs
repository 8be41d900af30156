//! End-of-file summary

/// Counts and times the recorder wrote after the last frame (V2+)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trailer {
    /// Number of frames the recorder wrote
    pub frame_count: u32,
    /// Number of frame entries the recorder wrote
    pub entry_count: u32,
    /// Session time of the first frame
    pub time_start: f32,
    /// Session time of the last frame
    pub time_end: f32,
    /// CRC32 of the frame section bytes (V3)
    pub frames_crc32: Option<u32>,
}

impl Trailer {
    /// Recorded span in session seconds
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.time_end - self.time_start
    }
}
