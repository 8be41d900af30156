//! Per-tick snapshots

use super::event::ReplayEvent;

/// Driver inputs, raw as packed in the telemetry words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    /// Throttle, 6 bits
    pub throttle: u8,
    /// Brake, 6 bits
    pub brake: u8,
    /// Steering yaw, 7 bits
    pub steer: u8,
}

/// Boolean state bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct VehicleFlags {
    /// Car is in the pit lane
    pub in_pit: bool,
    /// Horn pressed
    pub horn: bool,
    /// Headlights on
    pub headlights: bool,
    /// Warning light on
    pub warning_light: bool,
    /// Car is following another closely
    pub following: bool,
    /// Driver model visible
    pub driver_visible: bool,
}

/// Parts that can come off a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetachablePart {
    /// Front-left wheel
    FrontLeftWheel,
    /// Front-right wheel
    FrontRightWheel,
    /// Rear-left wheel
    RearLeftWheel,
    /// Rear-right wheel
    RearRightWheel,
    /// Front wing
    FrontWing,
    /// Rear wing
    RearWing,
    /// Bodywork debris piece 0..=11
    Debris(u8),
}

impl DetachablePart {
    /// Every part, in bit order of the wheels first
    pub const ALL: [Self; 18] = [
        Self::FrontLeftWheel,
        Self::FrontRightWheel,
        Self::RearLeftWheel,
        Self::RearRightWheel,
        Self::FrontWing,
        Self::RearWing,
        Self::Debris(0),
        Self::Debris(1),
        Self::Debris(2),
        Self::Debris(3),
        Self::Debris(4),
        Self::Debris(5),
        Self::Debris(6),
        Self::Debris(7),
        Self::Debris(8),
        Self::Debris(9),
        Self::Debris(10),
        Self::Debris(11),
    ];

    /// Bit position in the second telemetry word, `None` for debris > 11
    #[must_use]
    pub fn bit(self) -> Option<u32> {
        match self {
            Self::FrontLeftWheel => Some(22),
            Self::FrontRightWheel => Some(23),
            Self::RearLeftWheel => Some(24),
            Self::RearRightWheel => Some(25),
            Self::FrontWing => Some(26),
            Self::RearWing => Some(27),
            Self::Debris(n @ 0..=3) => Some(28 + u32::from(n)),
            Self::Debris(n @ 4..=11) => Some(u32::from(n) - 4),
            Self::Debris(_) => None,
        }
    }
}

/// Detached-part mask, the raw second telemetry word
///
/// The wheel bits share positions with some state flags; the format packs
/// both into the same word and this type reads it as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageState(pub u32);

impl DamageState {
    /// True if the part is flagged as detached
    #[must_use]
    pub fn is_detached(self, part: DetachablePart) -> bool {
        part.bit().is_some_and(|bit| (self.0 >> bit) & 1 != 0)
    }

    /// All parts flagged as detached
    pub fn detached(self) -> impl Iterator<Item = DetachablePart> {
        DetachablePart::ALL
            .into_iter()
            .filter(move |part| self.is_detached(*part))
    }
}

/// One vehicle's telemetry sample
///
/// `Option` fields are absent from older format variants.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Gear, -1 reverse, 0 neutral
    pub gear: i8,
    /// World position
    pub position: [f32; 3],
    /// Orientation angles
    pub orientation: [f32; 3],
    /// Velocity vector (V3)
    pub velocity: Option<[f32; 3]>,
    /// Driver inputs
    pub controls: Controls,
    /// Engine speed, 14 bits
    pub engine_rpm: u16,
    /// Traction control level, 2 bits
    pub traction_control: u8,
    /// Acceleration byte
    pub acceleration: u8,
    /// State bits
    pub flags: VehicleFlags,
    /// Which driver of a shared car is at the wheel, 2 bits
    pub current_driver: u8,
    /// Detached parts
    pub damage: DamageState,
    /// Packed speed word (V2+), meaning not decoded
    pub speed_raw: Option<u64>,
    /// Lap number (V3)
    pub lap: Option<u16>,
    /// Sector index (V3)
    pub sector: Option<u8>,
}

/// One simulation tick
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Session time of the tick, as stored
    pub timestamp: f32,
    vehicles: Vec<Option<VehicleState>>,
    events: Vec<ReplayEvent>,
}

impl FrameRecord {
    pub(crate) fn new(timestamp: f32) -> Self {
        Self {
            timestamp,
            vehicles: Vec::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn set_vehicle(&mut self, slot: u8, state: VehicleState) {
        let index = usize::from(slot);
        if self.vehicles.len() <= index {
            self.vehicles.resize(index + 1, None);
        }
        self.vehicles[index] = Some(state);
    }

    pub(crate) fn push_event(&mut self, event: ReplayEvent) {
        self.events.push(event);
    }

    /// State of one slot, `None` if the slot has no sample in this frame
    #[must_use]
    pub fn vehicle(&self, slot: u8) -> Option<&VehicleState> {
        self.vehicles.get(usize::from(slot)).and_then(Option::as_ref)
    }

    /// Slots with a sample in this frame, in slot order
    pub fn vehicles(&self) -> impl Iterator<Item = (u8, &VehicleState)> {
        self.vehicles
            .iter()
            .enumerate()
            .filter_map(|(slot, state)| state.as_ref().map(|s| (slot as u8, s)))
    }

    /// Number of slots with a sample
    #[must_use]
    pub fn active_vehicles(&self) -> usize {
        self.vehicles.iter().flatten().count()
    }

    /// Events recorded in this frame, in file order
    #[must_use]
    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }
}
