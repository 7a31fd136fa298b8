//! Wire framing for the grid-updates channel
//!
//! Every ZMQ message carries one JSON frame: `{"event": ..., "payload": ...}`.
//! The client sends a single `simulation_id` frame to subscribe; the producer
//! answers with a stream of `gridData` frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Event name of the subscription handshake.
pub const SUBSCRIBE_EVENT: &str = "simulation_id";
/// Event name of every stream payload.
pub const GRID_DATA_EVENT: &str = "gridData";

/// Opaque simulation identifier chosen by whoever started the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(String);

impl SimulationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Handshake payload. Numeric ids go out as JSON numbers, which is what
    /// the producer stores them as; anything else, including ids whose digits
    /// would not survive the round trip ("007"), is sent as a string.
    pub fn to_payload(&self) -> Value {
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => Value::from(n),
            _ => Value::from(self.0.clone()),
        }
    }
}

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SimulationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One event on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFrame {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl ChannelFrame {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// The subscription handshake for `id`.
    pub fn subscribe(id: &SimulationId) -> Self {
        Self::new(SUBSCRIBE_EVENT, id.to_payload())
    }

    /// A `gridData` frame wrapping `payload`.
    pub fn grid_data(payload: Value) -> Self {
        Self::new(GRID_DATA_EVENT, payload)
    }

    /// Simulation id carried by a subscription frame, if this is one.
    pub fn subscription_id(&self) -> Option<SimulationId> {
        if self.event != SUBSCRIBE_EVENT {
            return None;
        }
        match &self.payload {
            Value::String(s) => Some(SimulationId::new(s.clone())),
            Value::Number(n) => Some(SimulationId::new(n.to_string())),
            _ => None,
        }
    }
}

/// Errors encoding or decoding frames.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("empty message")]
    Empty,

    #[error("invalid frame JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a frame to bytes.
pub fn encode(frame: &ChannelFrame) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(frame)?)
}

/// Parse a frame from bytes.
pub fn decode(data: &[u8]) -> Result<ChannelFrame, WireError> {
    if data.is_empty() {
        return Err(WireError::Empty);
    }
    Ok(serde_json::from_slice(data)?)
}
