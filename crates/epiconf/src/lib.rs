//! Minimal configuration loading for epiview.
//!
//! This crate provides configuration loading with minimal dependencies,
//! designed to be imported by every epiview crate.
//!
//! # Configuration Philosophy
//!
//! - **Infrastructure** (`InfraConfig`): where the producer lives and how
//!   loudly we log. Fixed for the life of the process.
//!
//! - **Playback** (`PlaybackConfig`): pacing and viewport constants that
//!   seed the playback clock and grid geometry of each session.
//!
//! # Usage
//!
//! ```rust,no_run
//! use epiconf::EpiviewConfig;
//!
//! let config = EpiviewConfig::load().expect("Failed to load config");
//!
//! println!("Producer: {}", config.infra.producer.endpoint);
//! println!("Tick: {:?}", config.playback.tick_period());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/epiview/config.toml` (system)
//! 2. `~/.config/epiview/config.toml` (user)
//! 3. `./epiview.toml` (local override, or the `--config` path)
//! 4. Environment variables (`EPIVIEW_*`)
//!
//! # Example Config
//!
//! ```toml
//! [producer]
//! endpoint = "tcp://sim-host:5590"
//!
//! [playback]
//! tick_ms = 100
//! viewport_height = 900
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod infra;
pub mod loader;
pub mod playback;

pub use infra::{InfraConfig, ProducerConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};
pub use playback::PlaybackConfig;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete epiview configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EpiviewConfig {
    #[serde(flatten)]
    pub infra: InfraConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl EpiviewConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/epiview/config.toml`
    /// 3. `~/.config/epiview/config.toml`
    /// 4. `./epiview.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an explicit file replacing `./epiview.toml`.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = EpiviewConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# epiview configuration\n\n");

        output.push_str("[producer]\n");
        output.push_str(&format!(
            "endpoint = \"{}\"\n",
            self.infra.producer.endpoint
        ));
        output.push_str(&format!(
            "identity_prefix = \"{}\"\n",
            self.infra.producer.identity_prefix
        ));

        output.push_str("\n[playback]\n");
        output.push_str(&format!("tick_ms = {}\n", self.playback.tick_ms));
        output.push_str(&format!(
            "viewport_height = {}\n",
            self.playback.viewport_height
        ));
        output.push_str(&format!(
            "chrome_height = {}\n",
            self.playback.chrome_height
        ));
        output.push_str(&format!(
            "min_stroke_width = {}\n",
            self.playback.min_stroke_width
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.infra.telemetry.log_level
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EpiviewConfig::default();
        assert_eq!(config.infra.producer.endpoint, "tcp://localhost:5590");
        assert_eq!(config.playback.tick_ms, 100);
        assert_eq!(config.playback.chrome_height, 165);
    }

    #[test]
    fn test_to_toml() {
        let config = EpiviewConfig::default();
        let toml = config.to_toml();
        assert!(toml.contains("[producer]"));
        assert!(toml.contains("[playback]"));
        assert!(toml.contains("tick_ms = 100"));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = EpiviewConfig::default();
        config.playback.tick_ms = 250;
        config.infra.producer.endpoint = "tcp://sim:6000".to_string();

        let parsed = loader::parse_toml(&config.to_toml(), std::path::Path::new("x.toml")).unwrap();
        assert_eq!(parsed, config);
    }
}
