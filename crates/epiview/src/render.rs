//! Render sinks
//!
//! A sink draws one frame: the session's metadata plus the snapshot at the
//! playback cursor. Drawing is synchronous and holds no pipeline state.

pub mod svg;
pub mod terminal;

use std::io;

use epiproto::HealthState;
use thiserror::Error;

use crate::buffer::Snapshot;
use crate::metadata::GridMetadata;

pub use svg::SvgSink;
pub use terminal::TerminalSink;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("render sink failed: {0}")]
    Sink(String),
}

pub trait RenderSink {
    fn draw(&mut self, metadata: &GridMetadata, snapshot: &Snapshot) -> Result<(), RenderError>;
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn draw(&mut self, metadata: &GridMetadata, snapshot: &Snapshot) -> Result<(), RenderError> {
        (**self).draw(metadata, snapshot)
    }
}

/// How one health state is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateStyle {
    /// Single character for text grids
    pub glyph: char,
    /// RGB fill colour
    pub rgb: (u8, u8, u8),
    /// Higher wins when several agents share a terminal cell
    pub rank: u8,
}

impl StateStyle {
    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Style for unrecognized states.
pub const UNKNOWN_STYLE: StateStyle = StateStyle {
    glyph: '?',
    rgb: (160, 160, 160),
    rank: 0,
};

pub fn style_for(state: &HealthState) -> StateStyle {
    match state {
        HealthState::Susceptible => StateStyle {
            glyph: 's',
            rgb: (54, 162, 235),
            rank: 1,
        },
        HealthState::Recovered => StateStyle {
            glyph: 'r',
            rgb: (75, 192, 92),
            rank: 2,
        },
        HealthState::Exposed => StateStyle {
            glyph: 'e',
            rgb: (255, 159, 64),
            rank: 3,
        },
        HealthState::Infected => StateStyle {
            glyph: 'I',
            rgb: (220, 53, 69),
            rank: 4,
        },
        HealthState::Hospitalized => StateStyle {
            glyph: 'H',
            rgb: (153, 102, 255),
            rank: 5,
        },
        HealthState::Deceased => StateStyle {
            glyph: 'D',
            rgb: (40, 40, 40),
            rank: 6,
        },
        HealthState::Unknown(_) => UNKNOWN_STYLE,
    }
}
