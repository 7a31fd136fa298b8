//! Grid metadata and the rendering geometry derived from it
//!
//! Received once per session. The geometry fits a `grid_size` × `grid_size`
//! board into the configured viewport:
//!
//! - `cell = floor((viewport_height - chrome_height) / grid_size)`
//! - `stroke = floor(cell / 4)`, or 0 when that is below the minimum stroke
//! - `canvas = grid_size * cell + stroke`

use epiconf::PlaybackConfig;
use epiproto::{AreaRect, GridMessage};

/// Which named region of the town an area describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Housing,
    Work,
    Transport,
    Hospital,
}

impl AreaKind {
    pub fn label(&self) -> &'static str {
        match self {
            AreaKind::Housing => "housing",
            AreaKind::Work => "work",
            AreaKind::Transport => "transport",
            AreaKind::Hospital => "hospital",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedArea {
    pub kind: AreaKind,
    pub rect: AreaRect,
}

/// Pixel geometry of the rendered grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub cell_size: u32,
    pub stroke_width: u32,
    pub canvas_size: u32,
}

impl GridGeometry {
    pub fn compute(grid_size: u32, config: &PlaybackConfig) -> Self {
        let usable = config.viewport_height.saturating_sub(config.chrome_height);
        let cell_size = usable / grid_size.max(1);
        let quarter = cell_size / 4;
        let stroke_width = if quarter < config.min_stroke_width {
            0
        } else {
            quarter
        };
        let canvas_size = grid_size.saturating_mul(cell_size).saturating_add(stroke_width);

        Self {
            cell_size,
            stroke_width,
            canvas_size,
        }
    }

    /// Pixel centre of grid coordinate `coord` along one axis.
    pub fn agent_center(&self, coord: i64) -> i64 {
        let cell = self.cell_size as f64;
        (coord as f64 * cell + 0.5 * cell + self.stroke_width as f64).floor() as i64
    }

    pub fn agent_radius(&self) -> u32 {
        self.cell_size / 2
    }
}

/// Immutable description of the simulated town.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMetadata {
    grid_size: u32,
    areas: Vec<NamedArea>,
    houses: Vec<AreaRect>,
    offices: Vec<AreaRect>,
    geometry: GridGeometry,
}

impl GridMetadata {
    /// Build metadata from the wire message. `grid.grid_size` is positive by
    /// the time classification lets a message through.
    pub fn from_message(grid: GridMessage, config: &PlaybackConfig) -> Self {
        let areas = [
            (AreaKind::Housing, grid.housing_area),
            (AreaKind::Work, grid.work_area),
            (AreaKind::Transport, grid.transport_area),
            (AreaKind::Hospital, grid.hospital_area),
        ]
        .into_iter()
        .filter_map(|(kind, rect)| rect.map(|rect| NamedArea { kind, rect }))
        .collect();

        Self {
            grid_size: grid.grid_size,
            areas,
            houses: grid.houses,
            offices: grid.offices,
            geometry: GridGeometry::compute(grid.grid_size, config),
        }
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn areas(&self) -> &[NamedArea] {
        &self.areas
    }

    pub fn area(&self, kind: AreaKind) -> Option<&AreaRect> {
        self.areas.iter().find(|a| a.kind == kind).map(|a| &a.rect)
    }

    pub fn houses(&self) -> &[AreaRect] {
        &self.houses
    }

    pub fn offices(&self) -> &[AreaRect] {
        &self.offices
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }
}
