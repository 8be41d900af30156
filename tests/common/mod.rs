//! Synthetic replay builder shared by integration tests and benches

#![allow(dead_code)]

use rf2_vcr::format::VCR_MAGIC;

/// Install a test subscriber once; `RUST_LOG` controls the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Pack an entry header word
pub fn entry_word(slot: u8, size: usize, kind: u8, class: u8) -> u32 {
    u32::from(slot) | (size as u32) << 8 | u32::from(kind) << 17 | u32::from(class) << 29
}

/// Telemetry payload shaped for a format version
pub fn telemetry(version: u32, x: f32) -> Vec<u8> {
    let info1: u32 = 40 | 30 << 11 | 6500 << 18;
    let info2: u32 = 0x40 << 24 | 1 << 20;

    let mut data = info1.to_le_bytes().to_vec();
    data.extend_from_slice(&info2.to_le_bytes());
    if version >= 2 {
        data.extend_from_slice(&[0x10, 0, 0, 0, 0]);
        data.extend_from_slice(&[0; 25]);
    }
    data.push(0b01_001010);
    for v in [x, 0.0, -x, 0.0, 1.5, 0.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if version >= 3 {
        for v in [10.0f32, 0.0, 0.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(0);
    }
    data
}

/// Lay out sections behind a header whose table lists them in order
pub fn assemble(version: u32, sections: &[Vec<u8>]) -> Vec<u8> {
    let table_end = 8 + 8 * sections.len();
    let mut data = VCR_MAGIC.to_vec();
    data.extend_from_slice(&version.to_le_bytes());

    let mut offset = table_end;
    for section in sections {
        data.extend_from_slice(&(offset as u32).to_le_bytes());
        data.extend_from_slice(&(section.len() as u32).to_le_bytes());
        offset += section.len();
    }
    for section in sections {
        data.extend_from_slice(section);
    }
    data
}

struct FrameSpec {
    timestamp: f32,
    entries: Vec<Vec<u8>>,
}

/// Builds well-formed replays for a version
pub struct ReplayBuilder {
    version: u32,
    roster_version: u32,
    drivers: Vec<(u8, String)>,
    track: Option<String>,
    frames: Vec<FrameSpec>,
}

impl ReplayBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            roster_version: version,
            drivers: Vec::new(),
            track: None,
            frames: Vec::new(),
        }
    }

    /// Encode the roster with another version's layout
    pub fn roster_layout(mut self, version: u32) -> Self {
        self.roster_version = version;
        self
    }

    pub fn driver(mut self, number: u8, name: &str) -> Self {
        self.drivers.push((number, name.to_string()));
        self
    }

    pub fn session(mut self, track: &str) -> Self {
        self.track = Some(track.to_string());
        self
    }

    /// Add a frame with a telemetry sample for each slot
    pub fn frame(mut self, timestamp: f32, slots: &[u8]) -> Self {
        let entries = slots
            .iter()
            .map(|&slot| {
                let payload = telemetry(self.version.min(3), timestamp + f32::from(slot));
                encode_entry(slot, 10, 0, &payload)
            })
            .collect();
        self.frames.push(FrameSpec { timestamp, entries });
        self
    }

    /// Append an event entry to the last frame
    pub fn event(mut self, slot: u8, class: u8, kind: u8, payload: &[u8]) -> Self {
        if let Some(frame) = self.frames.last_mut() {
            frame.entries.push(encode_entry(slot, kind, class, payload));
        }
        self
    }

    pub fn roster_section(&self) -> Vec<u8> {
        let v = self.roster_version.min(3);
        let mut data = (self.drivers.len() as u32).to_le_bytes().to_vec();
        for (number, name) in &self.drivers {
            data.push(*number);
            p1(&mut data, name);
            if v >= 2 {
                p1(&mut data, "");
                p1(&mut data, "Works Team");
            }
            p2(&mut data, "GT3 Car");
            if v >= 2 {
                p2(&mut data, "GT3");
            }
            if v >= 3 {
                p2(&mut data, "1.0");
                p2(&mut data, "car-uid");
            }
            let mut file = b"gt3.veh".to_vec();
            file.resize(32, 0);
            data.extend_from_slice(&file);
            if v >= 2 {
                data.push(*number);
            }
            if v >= 3 {
                data.extend_from_slice(&[0; 48]);
            }
            data.extend_from_slice(&0.0f32.to_le_bytes());
            data.extend_from_slice(&3600.0f32.to_le_bytes());
        }
        data
    }

    pub fn session_section(&self) -> Vec<u8> {
        let Some(track) = &self.track else {
            return Vec::new();
        };
        let v = self.version.min(3);
        let mut data = Vec::new();
        p4(&mut data, "GT3.rfm");
        if v >= 2 {
            p4(&mut data, "mod info");
        }
        p4(&mut data, track);
        p4(&mut data, "track.aiw");
        if v >= 2 {
            p2(&mut data, "GT3 Pack");
            p2(&mut data, "2.0");
            p2(&mut data, "mod-uid");
            p2(&mut data, "Locations/Track");
        }
        data.push(10);
        if v >= 2 {
            data.extend_from_slice(&20.0f32.to_le_bytes());
            data.extend_from_slice(&28.0f32.to_le_bytes());
            data.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        }
        if v >= 3 {
            data.extend_from_slice(&0.0f32.to_le_bytes());
            data.extend_from_slice(&0.0f32.to_le_bytes());
        }
        data
    }

    pub fn frames_section(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for frame in &self.frames {
            data.extend_from_slice(&frame.timestamp.to_le_bytes());
            data.extend_from_slice(&(frame.entries.len() as u16).to_le_bytes());
            for entry in &frame.entries {
                data.extend_from_slice(entry);
            }
        }
        data
    }

    pub fn trailer_section(&self) -> Vec<u8> {
        let entries: usize = self.frames.iter().map(|f| f.entries.len()).sum();
        let first = self.frames.first().map_or(0.0, |f| f.timestamp);
        let last = self.frames.last().map_or(0.0, |f| f.timestamp);

        let mut data = (self.frames.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&(entries as u32).to_le_bytes());
        data.extend_from_slice(&first.to_le_bytes());
        data.extend_from_slice(&last.to_le_bytes());
        if self.version >= 3 {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(&self.frames_section());
            data.extend_from_slice(&hasher.finalize().to_le_bytes());
        }
        data
    }

    /// Every section in table order
    pub fn sections(&self) -> Vec<Vec<u8>> {
        let mut sections = vec![
            self.roster_section(),
            self.session_section(),
            self.frames_section(),
        ];
        if self.version >= 2 {
            sections.push(self.trailer_section());
        }
        sections
    }

    pub fn build(&self) -> Vec<u8> {
        assemble(self.version, &self.sections())
    }
}

fn encode_entry(slot: u8, kind: u8, class: u8, payload: &[u8]) -> Vec<u8> {
    let mut data = entry_word(slot, payload.len(), kind, class)
        .to_le_bytes()
        .to_vec();
    data.push(0);
    data.extend_from_slice(payload);
    data
}

fn p1(data: &mut Vec<u8>, s: &str) {
    data.push(s.len() as u8);
    data.extend_from_slice(s.as_bytes());
}

fn p2(data: &mut Vec<u8>, s: &str) {
    data.extend_from_slice(&(s.len() as u16).to_le_bytes());
    data.extend_from_slice(s.as_bytes());
}

fn p4(data: &mut Vec<u8>, s: &str) {
    data.extend_from_slice(&(s.len() as u32).to_le_bytes());
    data.extend_from_slice(s.as_bytes());
}
