//! StreamSession - one subscription to a simulation's grid updates
//!
//! Owns the channel and everything received on it. Each inbound frame is
//! classified once into a `StreamMessage` and handled:
//!
//! - end of stream: mark exhausted, close the channel
//! - grid metadata: store the first one, drop the rest
//! - snapshot: append to the buffer in arrival order
//! - anything else: log and drop
//!
//! Transport failures mark the session `Failed`. They never set `exhausted`,
//! so a dropped connection is not mistaken for a finished simulation.

use epiconf::PlaybackConfig;
use epiproto::{ChannelFrame, SimulationId, StreamMessage};
use tracing::{debug, error, info, warn};

use crate::buffer::{Snapshot, SnapshotBuffer};
use crate::channel::{Channel, ChannelError};
use crate::metadata::GridMetadata;

/// Coarse lifecycle of a session, as a viewer would describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Subscribed, no metadata yet.
    Loading,
    /// Metadata received, snapshots may still arrive.
    Live,
    /// Producer signalled end of stream.
    Exhausted,
    /// Channel lost before end of stream. Buffered frames remain playable.
    Failed,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Live => "live",
            SessionStatus::Exhausted => "complete",
            SessionStatus::Failed => "connection lost",
        }
    }
}

/// Everything a session has received.
#[derive(Debug, Default)]
pub struct SessionState {
    metadata: Option<GridMetadata>,
    buffer: SnapshotBuffer,
    exhausted: bool,
    failure: Option<String>,
}

impl SessionState {
    pub fn metadata(&self) -> Option<&GridMetadata> {
        self.metadata.as_ref()
    }

    pub fn buffer(&self) -> &SnapshotBuffer {
        &self.buffer
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Why the channel was lost, if it was.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub(crate) fn store_metadata(&mut self, metadata: GridMetadata) {
        self.metadata = Some(metadata);
    }

    pub(crate) fn push_snapshot(&mut self, snapshot: Snapshot) -> usize {
        self.buffer.append(snapshot)
    }

    pub(crate) fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    pub(crate) fn mark_failed(&mut self, reason: String) {
        self.failure = Some(reason);
    }

    pub fn status(&self) -> SessionStatus {
        if self.exhausted {
            SessionStatus::Exhausted
        } else if self.failure.is_some() {
            SessionStatus::Failed
        } else if self.metadata.is_some() {
            SessionStatus::Live
        } else {
            SessionStatus::Loading
        }
    }
}

/// What handling one inbound event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MetadataStored,
    DuplicateMetadata,
    SnapshotAppended { index: usize },
    Ended,
    Discarded { reason: String },
    /// Arrived after the session stopped accepting input.
    Late,
    ChannelLost { reason: String },
}

pub struct StreamSession {
    id: SimulationId,
    channel: Option<Box<dyn Channel>>,
    state: SessionState,
    config: PlaybackConfig,
}

impl StreamSession {
    /// Take ownership of `channel` and subscribe to `id`.
    ///
    /// If the handshake cannot be sent the channel is released before the
    /// error is returned.
    pub async fn open<C>(
        channel: C,
        id: SimulationId,
        config: PlaybackConfig,
    ) -> Result<Self, ChannelError>
    where
        C: Channel + 'static,
    {
        let mut channel: Box<dyn Channel> = Box::new(channel);

        if let Err(e) = channel.send(ChannelFrame::subscribe(&id)).await {
            channel.close();
            return Err(e);
        }
        info!("subscribed to simulation {}", id);

        Ok(Self {
            id,
            channel: Some(channel),
            state: SessionState::default(),
            config,
        })
    }

    pub fn id(&self) -> &SimulationId {
        &self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    /// Whether the channel is still held.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Wait for and handle the next inbound frame.
    ///
    /// Never resolves once the session is closed, so it can sit in a
    /// `select!` next to other event sources.
    pub async fn next_event(&mut self) -> SessionEvent {
        let Some(channel) = self.channel.as_mut() else {
            return std::future::pending().await;
        };

        match channel.recv().await {
            Some(Ok(frame)) => self.handle(StreamMessage::from_frame(frame)),
            Some(Err(e)) if e.is_recoverable() => {
                warn!("simulation {}: dropping frame: {}", self.id, e);
                SessionEvent::Discarded {
                    reason: e.to_string(),
                }
            }
            Some(Err(e)) => self.fail(e.to_string()),
            None => self.fail("channel closed before end of stream".to_string()),
        }
    }

    fn handle(&mut self, message: StreamMessage) -> SessionEvent {
        if self.state.exhausted || self.state.failure.is_some() {
            debug!("simulation {}: ignoring late {}", self.id, message.kind());
            return SessionEvent::Late;
        }

        match message {
            StreamMessage::EndOfStream => {
                self.state.mark_exhausted();
                info!(
                    "simulation {} ended after {} snapshots",
                    self.id,
                    self.state.buffer.len()
                );
                self.close();
                SessionEvent::Ended
            }
            StreamMessage::Metadata(grid) => {
                if self.state.metadata.is_some() {
                    debug!(
                        "simulation {}: ignoring repeated metadata (grid_size={})",
                        self.id, grid.grid_size
                    );
                    return SessionEvent::DuplicateMetadata;
                }
                let metadata = GridMetadata::from_message(grid, &self.config);
                info!(
                    "simulation {}: grid {}x{}, cell {}px",
                    self.id,
                    metadata.grid_size(),
                    metadata.grid_size(),
                    metadata.geometry().cell_size
                );
                self.state.store_metadata(metadata);
                SessionEvent::MetadataStored
            }
            StreamMessage::Snapshot(msg) => {
                let index = self.state.push_snapshot(Snapshot::from(msg));
                debug!("simulation {}: buffered snapshot {}", self.id, index);
                SessionEvent::SnapshotAppended { index }
            }
            StreamMessage::Unrecognized { reason } => {
                warn!("simulation {}: dropping message: {}", self.id, reason);
                SessionEvent::Discarded { reason }
            }
        }
    }

    fn fail(&mut self, reason: String) -> SessionEvent {
        error!(
            "simulation {}: channel lost with {} snapshots buffered: {}",
            self.id,
            self.state.buffer.len(),
            reason
        );
        self.state.mark_failed(reason.clone());
        self.close();
        SessionEvent::ChannelLost { reason }
    }

    /// Release the channel. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
            debug!("simulation {}: channel released", self.id);
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}
