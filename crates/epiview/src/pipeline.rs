//! The viewer's run loop
//!
//! One `select!` over three sources, each handled to completion before the
//! next is polled:
//!
//! - inbound frames, fed to the `StreamSession`
//! - clock ticks, fed to the `PlaybackController`
//! - user commands
//!
//! Whatever ends the loop (quit, render failure, input closed, playback
//! finished) the clock is dropped and the channel released before `run`
//! returns.

use std::fmt;
use std::str::FromStr;

use epiconf::PlaybackConfig;
use epiproto::SimulationId;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelError};
use crate::playback::{PlaybackCommand, PlaybackController, PlaybackError, PlaybackStatus, TickOutcome};
use crate::render::RenderSink;
use crate::session::{SessionEvent, SessionStatus, StreamSession};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Start playing as soon as the pipeline runs.
    pub autoplay: bool,
    /// Return once nothing more can be shown, instead of waiting for `quit`.
    pub exit_on_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Playback(PlaybackCommand),
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command '{0}' (expected start, pause, resume, stop, status or quit)")]
pub struct ParseCommandError(String);

impl FromStr for UserCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s.trim().to_ascii_lowercase().as_str() {
            "start" | "play" => UserCommand::Playback(PlaybackCommand::Start),
            "pause" => UserCommand::Playback(PlaybackCommand::Pause),
            "resume" => UserCommand::Playback(PlaybackCommand::Resume),
            "stop" | "reset" => UserCommand::Playback(PlaybackCommand::Stop),
            "status" => UserCommand::Status,
            "quit" | "exit" | "q" => UserCommand::Quit,
            _ => return Err(ParseCommandError(s.trim().to_string())),
        };
        Ok(command)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open session: {0}")]
    Open(#[source] ChannelError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Where things stood when the pipeline stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub simulation: SimulationId,
    pub frames_rendered: usize,
    pub buffered: usize,
    pub cursor: usize,
    pub session: SessionStatus,
    pub playback: PlaybackStatus,
    pub failure: Option<String>,
}

impl PipelineReport {
    /// True when the stream ended normally and every frame was shown.
    pub fn is_complete(&self) -> bool {
        self.session == SessionStatus::Exhausted && self.cursor == self.buffered
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "simulation {}: {} frames rendered, {}/{} hrs, stream {}, playback {}",
            self.simulation,
            self.frames_rendered,
            self.cursor,
            self.buffered,
            self.session.label(),
            self.playback
        )?;
        if let Some(reason) = &self.failure {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

pub struct Pipeline<S: RenderSink> {
    session: StreamSession,
    playback: PlaybackController,
    sink: S,
    options: PipelineOptions,
    frames_rendered: usize,
}

impl<S: RenderSink> Pipeline<S> {
    /// Subscribe to `id` over `channel` and get ready to play into `sink`.
    pub async fn open<C>(
        channel: C,
        id: SimulationId,
        config: &PlaybackConfig,
        sink: S,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError>
    where
        C: Channel + 'static,
    {
        let session = StreamSession::open(channel, id, config.clone())
            .await
            .map_err(PipelineError::Open)?;

        Ok(Self {
            session,
            playback: PlaybackController::new(config.tick_period()),
            sink,
            options,
            frames_rendered: 0,
        })
    }

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// One-line summary for the `status` command.
    pub fn status_line(&self) -> String {
        let state = self.session.state();
        let mut line = format!(
            "{} | stream {} | {} | {}",
            self.session.id(),
            state.status().label(),
            self.playback.status(),
            self.playback.progress(state.buffer().len()),
        );
        if state.metadata().is_none() {
            line.push_str(" | waiting for grid");
        }
        line.push_str(&format!(" | [{}]", self.playback.primary_action().label()));
        line
    }

    pub fn report(&self) -> PipelineReport {
        let state = self.session.state();
        PipelineReport {
            simulation: self.session.id().clone(),
            frames_rendered: self.frames_rendered,
            buffered: state.buffer().len(),
            cursor: self.playback.cursor(),
            session: state.status(),
            playback: self.playback.status(),
            failure: state.failure().map(str::to_string),
        }
    }

    /// Run until quit, input closes, a render fails, or (with
    /// `exit_on_complete`) nothing more can be shown.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<UserCommand>,
    ) -> Result<PipelineReport, PipelineError> {
        if self.options.autoplay {
            self.playback.apply(PlaybackCommand::Start);
        }

        let mut commands_open = true;
        let result = loop {
            if self.options.exit_on_complete && self.finished() {
                info!("nothing left to play for simulation {}", self.session.id());
                break Ok(());
            }
            // Only a command can start playback again.
            if !commands_open && self.playback.status() != PlaybackStatus::Playing {
                info!(
                    "command input closed with playback {}, nothing left to do",
                    self.playback.status()
                );
                break Ok(());
            }

            tokio::select! {
                event = self.session.next_event() => {
                    self.on_session_event(event);
                }
                _ = self.playback.next_tick() => {
                    match self.playback.on_tick(self.session.state(), &mut self.sink) {
                        Ok(TickOutcome::Rendered { .. }) => self.frames_rendered += 1,
                        Ok(TickOutcome::Completed) => {
                            info!("finished playing simulation {}", self.session.id());
                        }
                        Ok(TickOutcome::Waiting | TickOutcome::Inactive) => {}
                        Err(e) => break Err(PipelineError::from(e)),
                    }
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(UserCommand::Quit) => break Ok(()),
                        Some(UserCommand::Status) => info!("{}", self.status_line()),
                        Some(UserCommand::Playback(command)) => {
                            self.playback.apply(command);
                        }
                        None if self.options.exit_on_complete => {
                            debug!("command input closed, playing to the end");
                            commands_open = false;
                        }
                        None => break Ok(()),
                    }
                }
            }
        };

        self.teardown();
        result.map(|()| self.report())
    }

    /// The stream is over and every frame it delivered has been shown, or
    /// can never be shown.
    fn finished(&self) -> bool {
        if self.session.is_open() {
            return false;
        }
        let state = self.session.state();
        let drained = self.playback.cursor() >= state.buffer().len();
        let completed = state.is_exhausted() && self.playback.status() == PlaybackStatus::Stopped;
        state.metadata().is_none() || (drained && (completed || !state.is_exhausted()))
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::MetadataStored => info!("{}", self.status_line()),
            SessionEvent::Ended => info!("{}", self.status_line()),
            SessionEvent::ChannelLost { reason } => {
                warn!(
                    "stream for simulation {} lost ({}); {} buffered frames remain playable",
                    self.session.id(),
                    reason,
                    self.session.state().buffer().len()
                );
            }
            SessionEvent::SnapshotAppended { .. }
            | SessionEvent::DuplicateMetadata
            | SessionEvent::Discarded { .. }
            | SessionEvent::Late => {}
        }
    }

    fn teardown(&mut self) {
        self.playback.halt();
        self.session.close();
        debug!("pipeline for simulation {} torn down", self.session.id());
    }
}
