//! Text grid sink
//!
//! Draws the grid as one character per block of cells. Grids wider than
//! `max_columns` are downsampled; when several agents land in one block the
//! most severe state is shown.

use std::io::Write;

use owo_colors::OwoColorize;

use super::{style_for, RenderError, RenderSink, StateStyle};
use crate::buffer::Snapshot;
use crate::metadata::GridMetadata;

const EMPTY_CELL: char = '.';
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct TerminalSink<W: Write> {
    out: W,
    max_columns: u32,
    no_color: bool,
    clear: bool,
    frames: usize,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            max_columns: 80,
            no_color: false,
            clear: true,
            frames: 0,
        }
    }

    pub fn with_max_columns(mut self, columns: u32) -> Self {
        self.max_columns = columns.max(1);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.no_color = !color;
        self
    }

    /// Whether to clear the screen before each frame.
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Grid cells per character along each axis.
    fn scale(&self, grid_size: u32) -> u32 {
        grid_size.div_ceil(self.max_columns).max(1)
    }

    fn layout(&self, metadata: &GridMetadata, snapshot: &Snapshot) -> Vec<Vec<Option<StateStyle>>> {
        let scale = self.scale(metadata.grid_size());
        let side = metadata.grid_size().div_ceil(scale) as usize;
        let mut rows = vec![vec![None; side]; side];

        for agent in snapshot.agents() {
            let (x, y) = (agent.location.x, agent.location.y);
            if x < 0 || y < 0 {
                continue;
            }
            let col = (x / scale as i64) as usize;
            let row = (y / scale as i64) as usize;
            let Some(slot) = rows.get_mut(row).and_then(|r| r.get_mut(col)) else {
                continue;
            };
            let style = style_for(&agent.state);
            if slot.map_or(true, |current: StateStyle| style.rank > current.rank) {
                *slot = Some(style);
            }
        }
        rows
    }

    fn write_frame(&mut self, metadata: &GridMetadata, snapshot: &Snapshot) -> std::io::Result<()> {
        let rows = self.layout(metadata, snapshot);

        if self.clear {
            write!(self.out, "{}", CLEAR_SCREEN)?;
        }

        let hour = snapshot
            .hour()
            .map(|h| format!("hour {}", h))
            .unwrap_or_else(|| format!("frame {}", self.frames));
        let header = format!(
            "{} | grid {}x{} | {} agents",
            hour,
            metadata.grid_size(),
            metadata.grid_size(),
            snapshot.len()
        );
        if self.no_color {
            writeln!(self.out, "{}", header)?;
        } else {
            writeln!(self.out, "{}", header.bold())?;
        }

        for row in rows {
            let mut line = String::with_capacity(row.len() * 4);
            for cell in row {
                match cell {
                    None => line.push(EMPTY_CELL),
                    Some(style) if self.no_color => line.push(style.glyph),
                    Some(style) => {
                        let (r, g, b) = style.rgb;
                        line.push_str(&style.glyph.truecolor(r, g, b).to_string());
                    }
                }
            }
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn draw(&mut self, metadata: &GridMetadata, snapshot: &Snapshot) -> Result<(), RenderError> {
        self.write_frame(metadata, snapshot)?;
        self.frames += 1;
        Ok(())
    }
}
