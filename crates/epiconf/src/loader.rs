//! Config file discovery, loading, and environment variable overlay.

use crate::infra::{ProducerConfig, TelemetryConfig};
use crate::{ConfigError, EpiviewConfig, InfraConfig, PlaybackConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/epiview/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("epiview/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("epiview.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<EpiviewConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string.
///
/// Unknown keys are ignored so newer config files keep loading.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<EpiviewConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut infra = InfraConfig::default();

    if let Some(producer) = table.get("producer").and_then(|v| v.as_table()) {
        if let Some(v) = producer.get("endpoint").and_then(|v| v.as_str()) {
            infra.producer.endpoint = v.to_string();
        }
        if let Some(v) = producer.get("identity_prefix").and_then(|v| v.as_str()) {
            infra.producer.identity_prefix = v.to_string();
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            infra.telemetry.log_level = v.to_string();
        }
    }

    let mut playback = PlaybackConfig::default();

    if let Some(section) = table.get("playback").and_then(|v| v.as_table()) {
        if let Some(v) = section.get("tick_ms").and_then(|v| v.as_integer()) {
            playback.tick_ms = non_negative(v, "playback.tick_ms", path)?;
        }
        if let Some(v) = section.get("viewport_height").and_then(|v| v.as_integer()) {
            playback.viewport_height = non_negative(v, "playback.viewport_height", path)?;
        }
        if let Some(v) = section.get("chrome_height").and_then(|v| v.as_integer()) {
            playback.chrome_height = non_negative(v, "playback.chrome_height", path)?;
        }
        if let Some(v) = section.get("min_stroke_width").and_then(|v| v.as_integer()) {
            playback.min_stroke_width = non_negative(v, "playback.min_stroke_width", path)?;
        }
    }

    Ok(EpiviewConfig { infra, playback })
}

fn non_negative<T: TryFrom<i64>>(value: i64, key: &str, path: &Path) -> Result<T, ConfigError> {
    T::try_from(value).map_err(|_| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{} out of range: {}", key, value),
    })
}

/// Merge two configs, with `overlay` taking precedence.
///
/// A field in `overlay` only wins when it differs from the compiled default,
/// so a user file that sets one key does not reset keys from the system file.
pub fn merge_configs(base: EpiviewConfig, overlay: EpiviewConfig) -> EpiviewConfig {
    let producer_default = ProducerConfig::default();
    let telemetry_default = TelemetryConfig::default();
    let playback_default = PlaybackConfig::default();

    EpiviewConfig {
        infra: InfraConfig {
            producer: ProducerConfig {
                endpoint: pick(
                    base.infra.producer.endpoint,
                    overlay.infra.producer.endpoint,
                    &producer_default.endpoint,
                ),
                identity_prefix: pick(
                    base.infra.producer.identity_prefix,
                    overlay.infra.producer.identity_prefix,
                    &producer_default.identity_prefix,
                ),
            },
            telemetry: TelemetryConfig {
                log_level: pick(
                    base.infra.telemetry.log_level,
                    overlay.infra.telemetry.log_level,
                    &telemetry_default.log_level,
                ),
            },
        },
        playback: PlaybackConfig {
            tick_ms: pick(
                base.playback.tick_ms,
                overlay.playback.tick_ms,
                &playback_default.tick_ms,
            ),
            viewport_height: pick(
                base.playback.viewport_height,
                overlay.playback.viewport_height,
                &playback_default.viewport_height,
            ),
            chrome_height: pick(
                base.playback.chrome_height,
                overlay.playback.chrome_height,
                &playback_default.chrome_height,
            ),
            min_stroke_width: pick(
                base.playback.min_stroke_width,
                overlay.playback.min_stroke_width,
                &playback_default.min_stroke_width,
            ),
        },
    }
}

fn pick<T: PartialEq>(base: T, overlay: T, default: &T) -> T {
    if overlay != *default {
        overlay
    } else {
        base
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut EpiviewConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("EPIVIEW_ENDPOINT") {
        config.infra.producer.endpoint = v;
        sources.env_overrides.push("EPIVIEW_ENDPOINT".to_string());
    }

    if let Ok(v) = env::var("EPIVIEW_TICK_MS") {
        if let Ok(ms) = v.parse() {
            config.playback.tick_ms = ms;
            sources.env_overrides.push("EPIVIEW_TICK_MS".to_string());
        }
    }
    if let Ok(v) = env::var("EPIVIEW_VIEWPORT_HEIGHT") {
        if let Ok(px) = v.parse() {
            config.playback.viewport_height = px;
            sources.env_overrides.push("EPIVIEW_VIEWPORT_HEIGHT".to_string());
        }
    }

    if let Ok(v) = env::var("EPIVIEW_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("EPIVIEW_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files_with_override(None);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[producer]
endpoint = "tcp://sim:7000"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.infra.producer.endpoint, "tcp://sim:7000");
        // Other values should be defaults
        assert_eq!(config.playback.tick_ms, 100);
        assert_eq!(config.infra.telemetry.log_level, "info");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[producer]
endpoint = "tcp://10.0.0.5:5590"
identity_prefix = "wall-display"

[playback]
tick_ms = 40
viewport_height = 1080
chrome_height = 200
min_stroke_width = 2

[telemetry]
log_level = "debug"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.infra.producer.endpoint, "tcp://10.0.0.5:5590");
        assert_eq!(config.infra.producer.identity_prefix, "wall-display");
        assert_eq!(config.playback.tick_ms, 40);
        assert_eq!(config.playback.viewport_height, 1080);
        assert_eq!(config.playback.chrome_height, 200);
        assert_eq!(config.playback.min_stroke_width, 2);
        assert_eq!(config.infra.telemetry.log_level, "debug");
    }

    #[test]
    fn test_parse_rejects_negative() {
        let toml = r#"
[playback]
tick_ms = -5
"#;
        let err = parse_toml(toml, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("playback.tick_ms"));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse_toml("[playback\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_merge_keeps_base_when_overlay_is_default() {
        let mut base = EpiviewConfig::default();
        base.infra.producer.endpoint = "tcp://system:1".to_string();
        base.playback.tick_ms = 50;

        let mut overlay = EpiviewConfig::default();
        overlay.playback.viewport_height = 600;

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.infra.producer.endpoint, "tcp://system:1");
        assert_eq!(merged.playback.tick_ms, 50);
        assert_eq!(merged.playback.viewport_height, 600);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epiview.toml");
        std::fs::write(&path, "[playback]\ntick_ms = 250\n").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.playback.tick_ms, 250);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
