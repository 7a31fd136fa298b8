//! Epiview: live viewer for epidemic simulation grids
//!
//! The producer pushes one snapshot per simulated hour at whatever rate the
//! simulation runs. Epiview buffers them and replays them at a fixed,
//! user-controlled pace:
//!
//! - **Session** (`session`): owns the channel, classifies each frame, keeps
//!   the grid metadata and the append-only snapshot buffer
//! - **Playback** (`playback`): cursor + status state machine driven by a
//!   `TickClock` that exists only while playing
//! - **Render** (`render`): sinks that draw one frame, to a terminal or to
//!   SVG files
//!
//! `Pipeline` ties them together in a single-threaded `select!` loop.

pub mod buffer;
pub mod channel;
pub mod metadata;
pub mod pipeline;
pub mod playback;
pub mod render;
pub mod session;
pub mod tick_clock;
pub mod zmq_channel;

pub use buffer::{AgentState, BufferError, Snapshot, SnapshotBuffer};
pub use channel::{memory_channel, Channel, ChannelError, MemoryChannel, MemoryProducer};
pub use metadata::{AreaKind, GridGeometry, GridMetadata, NamedArea};
pub use pipeline::{
    ParseCommandError, Pipeline, PipelineError, PipelineOptions, PipelineReport, UserCommand,
};
pub use playback::{
    PlaybackCommand, PlaybackController, PlaybackError, PlaybackStatus, PrimaryAction, Progress,
    TickOutcome,
};
pub use render::{RenderError, RenderSink, StateStyle, SvgSink, TerminalSink};
pub use session::{SessionEvent, SessionState, SessionStatus, StreamSession};
pub use tick_clock::TickClock;
pub use zmq_channel::ZmqChannel;
