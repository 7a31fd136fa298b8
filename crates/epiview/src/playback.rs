//! Playback controller
//!
//! A cursor into the session's snapshot buffer, advanced one frame per clock
//! tick while playing.
//!
//! | From                  | Action       | To       | Cursor    |
//! |-----------------------|--------------|----------|-----------|
//! | Idle, Paused, Stopped | start/resume | Playing  | unchanged |
//! | Playing               | pause        | Paused   | unchanged |
//! | any                   | stop         | Stopped  | 0         |
//! | Playing, end of data  | tick         | Stopped  | unchanged |
//!
//! **Key invariant:** the controller holds a `TickClock` if and only if it is
//! `Playing`. Every status change goes through `transition`, which is the only
//! place a clock is created or dropped.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::buffer::BufferError;
use crate::render::{RenderError, RenderSink};
use crate::session::SessionState;
use crate::tick_clock::TickClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing happened.
    Inactive,
    /// Drew the frame at `index` and advanced past it.
    Rendered { index: usize },
    /// Caught up with the stream, or metadata not in yet.
    Waiting,
    /// Every frame of a finished stream has been shown.
    Completed,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to render frame {index}: {source}")]
    Render {
        index: usize,
        #[source]
        source: RenderError,
    },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Label for the play/pause control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Start,
    Resume,
    Pause,
}

impl PrimaryAction {
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryAction::Start => "START",
            PrimaryAction::Resume => "RESUME",
            PrimaryAction::Pause => "PAUSE",
        }
    }

    /// The command pressing the control issues.
    pub fn command(&self) -> PlaybackCommand {
        match self {
            PrimaryAction::Start => PlaybackCommand::Start,
            PrimaryAction::Resume => PlaybackCommand::Resume,
            PrimaryAction::Pause => PlaybackCommand::Pause,
        }
    }
}

/// Frames shown out of frames buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub cursor: usize,
    pub len: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} hrs", self.cursor, self.len)
    }
}

pub struct PlaybackController {
    status: PlaybackStatus,
    cursor: usize,
    period: Duration,
    clock: Option<TickClock>,
}

impl PlaybackController {
    pub fn new(period: Duration) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            cursor: 0,
            period,
            clock: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a tick clock currently exists.
    pub fn clock_running(&self) -> bool {
        self.clock.is_some()
    }

    pub fn progress(&self, len: usize) -> Progress {
        Progress {
            cursor: self.cursor,
            len,
        }
    }

    pub fn primary_action(&self) -> PrimaryAction {
        match self.status {
            PlaybackStatus::Playing => PrimaryAction::Pause,
            _ if self.cursor == 0 => PrimaryAction::Start,
            _ => PrimaryAction::Resume,
        }
    }

    /// Apply a user command. Returns false if it did not apply to the
    /// current status.
    pub fn apply(&mut self, command: PlaybackCommand) -> bool {
        use PlaybackCommand::*;
        use PlaybackStatus::*;

        match (command, self.status) {
            (Start | Resume, Idle | Paused | Stopped) => {
                self.transition(Playing, None);
                true
            }
            (Pause, Playing) => {
                self.transition(Paused, None);
                true
            }
            (Stop, _) => {
                self.transition(Stopped, Some(0));
                true
            }
            (command, status) => {
                debug!("ignoring {:?} while {}", command, status);
                false
            }
        }
    }

    /// Stop ticking without moving the cursor. Used on teardown.
    pub fn halt(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.transition(PlaybackStatus::Paused, None);
        }
    }

    /// Wait for the next tick. Never resolves unless playing.
    pub async fn next_tick(&mut self) {
        match self.clock.as_mut() {
            Some(clock) => clock.tick().await,
            None => std::future::pending().await,
        }
    }

    /// Advance playback by one tick.
    ///
    /// On a render failure the cursor stays on the failed frame and playback
    /// pauses.
    pub fn on_tick<S>(
        &mut self,
        state: &SessionState,
        sink: &mut S,
    ) -> Result<TickOutcome, PlaybackError>
    where
        S: RenderSink + ?Sized,
    {
        if self.status != PlaybackStatus::Playing {
            return Ok(TickOutcome::Inactive);
        }

        let buffer = state.buffer();
        if self.cursor < buffer.len() {
            let Some(metadata) = state.metadata() else {
                debug!("frame {} buffered but no grid metadata yet", self.cursor);
                return Ok(TickOutcome::Waiting);
            };

            let index = self.cursor;
            let snapshot = buffer.at(index)?;
            if let Err(source) = sink.draw(metadata, snapshot) {
                error!("render failed on frame {}: {}", index, source);
                self.transition(PlaybackStatus::Paused, None);
                return Err(PlaybackError::Render { index, source });
            }

            self.cursor += 1;
            debug!("rendered frame {} ({})", index, self.progress(buffer.len()));
            return Ok(TickOutcome::Rendered { index });
        }

        if state.is_exhausted() {
            info!("playback complete at {}", self.progress(buffer.len()));
            self.transition(PlaybackStatus::Stopped, None);
            return Ok(TickOutcome::Completed);
        }

        Ok(TickOutcome::Waiting)
    }

    fn transition(&mut self, next: PlaybackStatus, cursor: Option<usize>) {
        let previous = self.status;
        self.status = next;
        if let Some(cursor) = cursor {
            self.cursor = cursor;
        }

        if next == PlaybackStatus::Playing {
            if self.clock.is_none() {
                self.clock = Some(TickClock::start(self.period));
            }
        } else {
            self.clock = None;
        }

        debug!(
            "playback {} -> {} at frame {}",
            previous, next, self.cursor
        );
    }
}
