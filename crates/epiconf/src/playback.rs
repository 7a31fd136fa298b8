//! Playback configuration - pacing and viewport constants.
//!
//! These are not user data: they seed the playback clock and the grid
//! geometry once per session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback pacing and rendering constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Period of the playback clock in milliseconds (one snapshot per tick).
    /// Default: 100
    #[serde(default = "PlaybackConfig::default_tick_ms")]
    pub tick_ms: u64,

    /// Height of the viewport the grid is fitted into, in pixels.
    /// Default: 900
    #[serde(default = "PlaybackConfig::default_viewport_height")]
    pub viewport_height: u32,

    /// Pixels reserved for controls and legend above the grid.
    /// Default: 165
    #[serde(default = "PlaybackConfig::default_chrome_height")]
    pub chrome_height: u32,

    /// Smallest border stroke worth drawing. Anything thinner becomes 0.
    /// Default: 1
    #[serde(default = "PlaybackConfig::default_min_stroke_width")]
    pub min_stroke_width: u32,
}

impl PlaybackConfig {
    fn default_tick_ms() -> u64 {
        100
    }

    fn default_viewport_height() -> u32 {
        900
    }

    fn default_chrome_height() -> u32 {
        165
    }

    fn default_min_stroke_width() -> u32 {
        1
    }

    /// Tick period as a `Duration`. A zero period is bumped to 1ms.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
            viewport_height: Self::default_viewport_height(),
            chrome_height: Self::default_chrome_height(),
            min_stroke_width: Self::default_min_stroke_width(),
        }
    }
}
