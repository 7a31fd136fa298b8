//! Grid-updates message shapes and their classification.
//!
//! The producer pushes three payload shapes on the `gridData` event and
//! tells them apart only by which fields are present. `StreamMessage::classify`
//! turns that implicit union into an explicit tag exactly once, at the
//! boundary, so nothing downstream probes JSON keys.
//!
//! Order matters: the end-of-stream marker is checked first, then grid
//! metadata, then the per-hour citizen list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::wire::{ChannelFrame, GRID_DATA_EVENT};

/// Key whose presence marks the end of the stream.
pub const END_OF_STREAM_KEY: &str = "simulation_ended";
/// Key whose presence marks a grid metadata payload.
pub const GRID_SIZE_KEY: &str = "grid_size";
/// Key whose presence marks a per-hour snapshot payload.
pub const CITIZEN_STATES_KEY: &str = "citizen_states";

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

impl Offset {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Rectangular region of the grid, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AreaRect {
    pub start_offset: Offset,
    pub end_offset: Offset,
    #[serde(default)]
    pub iter_index: Offset,
}

/// Grid metadata payload. Sent once, before any snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMessage {
    pub grid_size: u32,
    #[serde(default)]
    pub housing_area: Option<AreaRect>,
    #[serde(default)]
    pub work_area: Option<AreaRect>,
    #[serde(default)]
    pub transport_area: Option<AreaRect>,
    #[serde(default)]
    pub hospital_area: Option<AreaRect>,
    #[serde(default)]
    pub houses: Vec<AreaRect>,
    #[serde(default)]
    pub offices: Vec<AreaRect>,
}

/// Disease state of one citizen.
///
/// Wire values are matched case-insensitively on the full name or its first
/// letter. Anything else is kept verbatim in `Unknown` so a newer producer
/// never breaks an older viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthState {
    Susceptible,
    Exposed,
    Infected,
    Hospitalized,
    Recovered,
    Deceased,
    Unknown(String),
}

impl HealthState {
    pub fn as_str(&self) -> &str {
        match self {
            HealthState::Susceptible => "susceptible",
            HealthState::Exposed => "exposed",
            HealthState::Infected => "infected",
            HealthState::Hospitalized => "hospitalized",
            HealthState::Recovered => "recovered",
            HealthState::Deceased => "deceased",
            HealthState::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, HealthState::Unknown(_))
    }
}

impl From<&str> for HealthState {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "s" | "susceptible" => HealthState::Susceptible,
            "e" | "exposed" => HealthState::Exposed,
            "i" | "infected" => HealthState::Infected,
            "h" | "hospitalized" | "hospitalised" => HealthState::Hospitalized,
            "r" | "recovered" => HealthState::Recovered,
            "d" | "deceased" => HealthState::Deceased,
            _ => HealthState::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for HealthState {
    fn from(raw: String) -> Self {
        HealthState::from(raw.as_str())
    }
}

impl From<HealthState> for String {
    fn from(state: HealthState) -> Self {
        match state {
            HealthState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One citizen's state and position at a given hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenState {
    pub citizen_id: u64,
    pub state: HealthState,
    pub location: Offset,
}

/// Per-hour snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr: Option<u32>,
    pub citizen_states: Vec<CitizenState>,
}

/// Explicitly tagged view of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    EndOfStream,
    Metadata(GridMessage),
    Snapshot(SnapshotMessage),
    Unrecognized { reason: String },
}

impl StreamMessage {
    /// Classify a channel frame. Only `gridData` frames carry stream payloads.
    pub fn from_frame(frame: ChannelFrame) -> Self {
        if frame.event != GRID_DATA_EVENT {
            return StreamMessage::Unrecognized {
                reason: format!("unexpected event '{}'", frame.event),
            };
        }
        Self::classify(frame.payload)
    }

    /// Classify a `gridData` payload by the fields it carries.
    pub fn classify(payload: Value) -> Self {
        let map = match payload {
            Value::Object(map) => map,
            other => {
                return StreamMessage::Unrecognized {
                    reason: format!("payload is not an object: {}", kind_of(&other)),
                };
            }
        };

        if map.contains_key(END_OF_STREAM_KEY) {
            return StreamMessage::EndOfStream;
        }

        if map.contains_key(GRID_SIZE_KEY) {
            return match serde_json::from_value::<GridMessage>(Value::Object(map)) {
                Ok(grid) if grid.grid_size == 0 => StreamMessage::Unrecognized {
                    reason: "grid_size must be positive".to_string(),
                },
                Ok(grid) => StreamMessage::Metadata(grid),
                Err(e) => StreamMessage::Unrecognized {
                    reason: format!("malformed grid metadata: {}", e),
                },
            };
        }

        if map.contains_key(CITIZEN_STATES_KEY) {
            return match serde_json::from_value::<SnapshotMessage>(Value::Object(map)) {
                Ok(snapshot) => StreamMessage::Snapshot(snapshot),
                Err(e) => StreamMessage::Unrecognized {
                    reason: format!("malformed citizen states: {}", e),
                },
            };
        }

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        StreamMessage::Unrecognized {
            reason: format!("no known field among {:?}", keys),
        }
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::EndOfStream => "end_of_stream",
            StreamMessage::Metadata(_) => "metadata",
            StreamMessage::Snapshot(_) => "snapshot",
            StreamMessage::Unrecognized { .. } => "unrecognized",
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
