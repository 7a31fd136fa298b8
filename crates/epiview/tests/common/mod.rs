//! Common test utilities for epiview integration tests
//!
//! A recording render sink and builders for producer payloads.

#![allow(dead_code)]

use std::time::Duration;

use epiview::{GridMetadata, RenderError, RenderSink, Snapshot};
use serde_json::{json, Value};
use tokio::time::Instant;

/// One draw call as the sink saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnFrame {
    pub hour: Option<u32>,
    pub agents: usize,
    pub grid_size: u32,
    /// Time since the sink was created
    pub at: Duration,
}

/// Sink that records every frame, optionally failing on one of them.
pub struct RecordingSink {
    started: Instant,
    pub frames: Vec<DrawnFrame>,
    fail_on: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            frames: Vec::new(),
            fail_on: None,
        }
    }

    /// Fail the draw call with this zero-based number.
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new()
        }
    }

    pub fn hours(&self) -> Vec<u32> {
        self.frames.iter().filter_map(|f| f.hour).collect()
    }

    pub fn times_ms(&self) -> Vec<u128> {
        self.frames.iter().map(|f| f.at.as_millis()).collect()
    }
}

impl RenderSink for RecordingSink {
    fn draw(&mut self, metadata: &GridMetadata, snapshot: &Snapshot) -> Result<(), RenderError> {
        if self.fail_on == Some(self.frames.len()) {
            return Err(RenderError::Sink("display detached".to_string()));
        }
        self.frames.push(DrawnFrame {
            hour: snapshot.hour(),
            agents: snapshot.len(),
            grid_size: metadata.grid_size(),
            at: self.started.elapsed(),
        });
        Ok(())
    }
}

pub fn grid_payload(grid_size: u32) -> Value {
    json!({
        "grid_size": grid_size,
        "housing_area": {
            "start_offset": {"x": 0, "y": 0},
            "end_offset": {"x": 2, "y": grid_size - 1},
            "iter_index": {"x": 0, "y": 0}
        },
        "work_area": {
            "start_offset": {"x": 3, "y": 0},
            "end_offset": {"x": grid_size - 1, "y": grid_size - 1},
            "iter_index": {"x": 3, "y": 0}
        },
        "houses": [],
        "offices": []
    })
}

pub fn snapshot_payload(hour: u32, agents: u64) -> Value {
    let states = ["s", "e", "i", "h", "r", "d"];
    let citizens: Vec<Value> = (0..agents)
        .map(|id| {
            json!({
                "citizen_id": id,
                "state": states[(id as usize + hour as usize) % states.len()],
                "location": {"x": id % 5, "y": id / 5}
            })
        })
        .collect();
    json!({ "hr": hour, "citizen_states": citizens })
}

pub fn end_payload() -> Value {
    json!({ "simulation_ended": true })
}
