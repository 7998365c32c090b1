//! Sensor roles, reading snapshots, and wire payload types
//!
//! The JSON shapes here are a wire contract with the coordinator and must
//! not drift: discovery replies key on the role name, sensor replies carry
//! one scalar named after the role, and the status event uses `0`/`1`
//! integers rather than JSON booleans.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four fixed sensor categories the actuator depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorRole {
    Npk,
    Ph,
    Moisture,
    Temperature,
}

impl SensorRole {
    /// All roles, in the order they are discovered and polled.
    pub const ALL: [SensorRole; 4] = [
        SensorRole::Npk,
        SensorRole::Temperature,
        SensorRole::Ph,
        SensorRole::Moisture,
    ];

    /// Role name as it appears on the wire (discovery keys, payload fields).
    pub fn name(&self) -> &'static str {
        match self {
            SensorRole::Npk => "npk",
            SensorRole::Ph => "ph",
            SensorRole::Moisture => "moisture",
            SensorRole::Temperature => "temperature",
        }
    }

    /// Resource path served by the sensor for this role.
    pub fn resource_path(&self) -> &'static str {
        match self {
            SensorRole::Npk => "/npk",
            SensorRole::Ph => "/ph",
            SensorRole::Moisture => "/moisture",
            SensorRole::Temperature => "/temperature",
        }
    }

    /// Index into per-role tables (endpoint table slots).
    pub fn index(&self) -> usize {
        match self {
            SensorRole::Npk => 0,
            SensorRole::Ph => 1,
            SensorRole::Moisture => 2,
            SensorRole::Temperature => 3,
        }
    }
}

impl fmt::Display for SensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One cycle's aggregated sensor readings.
///
/// Built fresh each cycle by the poller; fields for unresponsive roles carry
/// the last-known value. Immutable once handed to classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSnapshot {
    pub nitrogen: i16,
    pub phosphorus: i16,
    pub potassium: i16,
    pub ph: i16,
    pub moisture: i16,
    pub temperature: i16,
}

/// Discrete seed class label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedCategory(pub i32);

impl fmt::Display for SeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grid configuration request, as received on the control surface.
///
/// Fields are signed so that out-of-range input can be rejected with the
/// offending value intact instead of failing at deserialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridConfigRequest {
    pub length: i64,
    pub width: i64,
    pub square_size: i64,
    pub field_id: i64,
}

impl GridConfigRequest {
    /// All four parameters must be positive and fit the grid's `u32`
    /// dimensions; anything outside that range is rejected, never narrowed.
    pub fn is_valid(&self) -> bool {
        fn in_range(v: i64) -> bool {
            v > 0 && v <= i64::from(u32::MAX)
        }
        in_range(self.length)
            && in_range(self.width)
            && in_range(self.square_size)
            && in_range(self.field_id)
    }
}

/// Status observation payload, re-emitted on every state change.
///
/// `complete` and `active` are `0`/`1` per the coordinator's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub complete: u8,
    pub active: u8,
}

impl StatusEvent {
    pub fn new(active: bool, complete: bool) -> Self {
        Self {
            complete: complete as u8,
            active: active as u8,
        }
    }
}
