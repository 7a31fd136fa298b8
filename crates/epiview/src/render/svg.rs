//! One SVG document per rendered frame
//!
//! Frames are numbered in render order, not by simulated hour, so a
//! directory listing replays in the order the viewer saw it.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{style_for, RenderError, RenderSink};
use crate::buffer::Snapshot;
use crate::metadata::GridMetadata;

pub struct SvgSink {
    dir: PathBuf,
    frames: usize,
}

impl SvgSink {
    /// Write frames into `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, frames: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn frame_path(&self, frame: usize) -> PathBuf {
        self.dir.join(format!("frame-{:06}.svg", frame))
    }

    /// Render one frame to an SVG string.
    pub fn document(metadata: &GridMetadata, snapshot: &Snapshot) -> String {
        let geometry = metadata.geometry();
        let size = geometry.canvas_size;
        let radius = geometry.agent_radius();

        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
        );
        if let Some(hour) = snapshot.hour() {
            let _ = writeln!(out, "  <title>hour {}</title>", hour);
        }
        let _ = writeln!(
            out,
            r#"  <rect width="{size}" height="{size}" fill="white"/>"#
        );
        for agent in snapshot.agents() {
            let _ = writeln!(
                out,
                r#"  <circle cx="{}" cy="{}" r="{}" fill="{}" data-state="{}"/>"#,
                geometry.agent_center(agent.location.x),
                geometry.agent_center(agent.location.y),
                radius,
                style_for(&agent.state).hex(),
                escape(agent.state.as_str()),
            );
        }
        out.push_str("</svg>\n");
        out
    }
}

impl RenderSink for SvgSink {
    fn draw(&mut self, metadata: &GridMetadata, snapshot: &Snapshot) -> Result<(), RenderError> {
        let path = self.frame_path(self.frames);
        fs::write(&path, Self::document(metadata, snapshot))?;
        debug!("wrote {}", path.display());
        self.frames += 1;
        Ok(())
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AgentState;
    use epiconf::PlaybackConfig;
    use epiproto::{GridMessage, HealthState, Offset};
    use tempfile::TempDir;

    fn metadata(grid_size: u32) -> GridMetadata {
        let grid = GridMessage {
            grid_size,
            housing_area: None,
            work_area: None,
            transport_area: None,
            hospital_area: None,
            houses: vec![],
            offices: vec![],
        };
        GridMetadata::from_message(grid, &PlaybackConfig::default())
    }

    fn agent(id: u64, state: HealthState, x: i64, y: i64) -> AgentState {
        AgentState {
            id,
            state,
            location: Offset::new(x, y),
        }
    }

    #[test]
    fn test_document_places_agents() {
        // grid 5: cell 147, stroke 36, radius 73
        let snapshot = Snapshot::new(
            Some(3),
            vec![
                agent(1, HealthState::Infected, 0, 0),
                agent(2, HealthState::Recovered, 2, 4),
            ],
        );
        let svg = SvgSink::document(&metadata(5), &snapshot);

        assert!(svg.contains(r#"width="771""#));
        assert!(svg.contains("<title>hour 3</title>"));
        assert!(svg.contains(r##"<circle cx="109" cy="109" r="73" fill="#dc3545""##));
        // 2*147 + 73.5 + 36 = 403.5, 4*147 + 73.5 + 36 = 697.5
        assert!(svg.contains(r#"cx="403" cy="697""#));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn test_unknown_state_is_escaped_and_drawn() {
        let snapshot = Snapshot::new(None, vec![agent(1, HealthState::Unknown("<z>".into()), 1, 1)]);
        let svg = SvgSink::document(&metadata(5), &snapshot);
        assert!(svg.contains(r#"data-state="&lt;z&gt;""#));
        assert!(svg.contains("#a0a0a0"));
        assert!(!svg.contains("<title>"));
    }

    #[test]
    fn test_draw_writes_numbered_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("frames");
        let mut sink = SvgSink::create(&out).unwrap();
        let meta = metadata(10);

        for hour in 0..3 {
            let snapshot = Snapshot::new(Some(hour), vec![agent(1, HealthState::Susceptible, 1, 1)]);
            sink.draw(&meta, &snapshot).unwrap();
        }

        assert_eq!(sink.frames(), 3);
        let mut names: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["frame-000000.svg", "frame-000001.svg", "frame-000002.svg"]
        );
        let last = fs::read_to_string(sink.frame_path(2)).unwrap();
        assert!(last.contains("<title>hour 2</title>"));
    }

    #[test]
    fn test_draw_into_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("gone");
        let mut sink = SvgSink::create(&out).unwrap();
        fs::remove_dir(&out).unwrap();

        let result = sink.draw(&metadata(5), &Snapshot::default());
        assert!(matches!(result, Err(RenderError::Io(_))));
        assert_eq!(sink.frames(), 0);
    }
}
