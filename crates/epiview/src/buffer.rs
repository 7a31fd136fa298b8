//! Append-only snapshot buffer
//!
//! One `Snapshot` per simulated hour, in arrival order. Nothing is ever
//! mutated or removed once appended, so an index handed out stays valid for
//! the life of the session.

use epiproto::{CitizenState, HealthState, Offset, SnapshotMessage};
use thiserror::Error;

/// One agent at one hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    pub id: u64,
    pub state: HealthState,
    pub location: Offset,
}

impl From<CitizenState> for AgentState {
    fn from(citizen: CitizenState) -> Self {
        Self {
            id: citizen.citizen_id,
            state: citizen.state,
            location: citizen.location,
        }
    }
}

/// Every agent at one simulated hour.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    hour: Option<u32>,
    agents: Vec<AgentState>,
}

impl Snapshot {
    pub fn new(hour: Option<u32>, agents: Vec<AgentState>) -> Self {
        Self { hour, agents }
    }

    /// Hour reported by the producer, if it sent one.
    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl From<SnapshotMessage> for Snapshot {
    fn from(msg: SnapshotMessage) -> Self {
        Self {
            hour: msg.hr,
            agents: msg.citizen_states.into_iter().map(AgentState::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("snapshot index {index} out of range (buffer holds {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered, append-only sequence of snapshots.
#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    snapshots: Vec<Snapshot>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot and return its index.
    pub fn append(&mut self, snapshot: Snapshot) -> usize {
        self.snapshots.push(snapshot);
        self.snapshots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot at `index`, or `OutOfRange` past the end.
    pub fn at(&self, index: usize) -> Result<&Snapshot, BufferError> {
        self.snapshots.get(index).ok_or(BufferError::OutOfRange {
            index,
            len: self.snapshots.len(),
        })
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(hour: u32, agents: usize) -> Snapshot {
        let agents = (0..agents as u64)
            .map(|id| AgentState {
                id,
                state: HealthState::Susceptible,
                location: Offset::new(id as i64, 0),
            })
            .collect();
        Snapshot::new(Some(hour), agents)
    }

    #[test]
    fn test_append_returns_index() {
        let mut buffer = SnapshotBuffer::new();
        assert_eq!(buffer.append(snapshot(0, 1)), 0);
        assert_eq!(buffer.append(snapshot(1, 1)), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_len_tracks_appends() {
        let mut buffer = SnapshotBuffer::new();
        let mut previous = buffer.len();
        for hour in 0..50 {
            buffer.append(snapshot(hour, (hour % 4) as usize));
            assert_eq!(buffer.len(), hour as usize + 1);
            assert!(buffer.len() > previous);
            previous = buffer.len();
        }
    }

    #[test]
    fn test_at_preserves_arrival_order() {
        let mut buffer = SnapshotBuffer::new();
        for hour in [7, 3, 9] {
            buffer.append(snapshot(hour, 2));
        }
        let hours: Vec<_> = buffer.iter().map(|s| s.hour()).collect();
        assert_eq!(hours, vec![Some(7), Some(3), Some(9)]);
        assert_eq!(buffer.at(1).unwrap().hour(), Some(3));
    }

    #[test]
    fn test_at_out_of_range() {
        let mut buffer = SnapshotBuffer::new();
        assert_eq!(
            buffer.at(0),
            Err(BufferError::OutOfRange { index: 0, len: 0 })
        );

        buffer.append(snapshot(0, 3));
        assert!(buffer.at(0).is_ok());
        assert_eq!(
            buffer.at(1),
            Err(BufferError::OutOfRange { index: 1, len: 1 })
        );
        assert!(buffer.get(1).is_none());
    }

    #[test]
    fn test_snapshot_from_message() {
        let msg = SnapshotMessage {
            hr: Some(12),
            citizen_states: vec![CitizenState {
                citizen_id: 77,
                state: HealthState::Recovered,
                location: Offset::new(3, 4),
            }],
        };
        let snapshot = Snapshot::from(msg);
        assert_eq!(snapshot.hour(), Some(12));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.agents()[0].id, 77);
        assert_eq!(snapshot.agents()[0].location, Offset::new(3, 4));
    }
}
