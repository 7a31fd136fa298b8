//! epiproto - Wire types for the epiview grid-updates channel
//!
//! A simulation producer pushes grid metadata, one snapshot per simulated
//! hour, and finally an end-of-stream marker to every subscribed viewer.
//!
//! ## Framing
//!
//! Each ZMQ message carries one JSON frame, `{"event": ..., "payload": ...}`
//! (see [`wire`]). The viewer's only outbound frame is the subscription
//! handshake, `{"event": "simulation_id", "payload": <id>}`.
//!
//! ## Classification
//!
//! `gridData` payloads are an implicitly tagged union. [`StreamMessage`]
//! parses them once into explicit variants (see [`grid`]).
//!
//! ## Sockets
//!
//! With the default `peer` feature, [`socket_config`] provides DEALER/ROUTER
//! helpers over tmq so viewers and test producers share one configuration.

pub mod grid;
#[cfg(feature = "peer")]
pub mod socket_config;
pub mod wire;

pub use grid::{
    AreaRect, CitizenState, GridMessage, HealthState, Offset, SnapshotMessage, StreamMessage,
};
pub use wire::{ChannelFrame, SimulationId, WireError, GRID_DATA_EVENT, SUBSCRIBE_EVENT};
