//! Infrastructure configuration - things that cannot change at runtime.

use serde::{Deserialize, Serialize};

/// Where the simulation producer lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// ZMQ ROUTER endpoint of the producer's grid-updates channel.
    /// Default: tcp://localhost:5590
    #[serde(default = "ProducerConfig::default_endpoint")]
    pub endpoint: String,

    /// Prefix for the DEALER routing identity. The session id is appended
    /// so concurrent viewers never collide on the producer's ROUTER.
    /// Default: epiview
    #[serde(default = "ProducerConfig::default_identity_prefix")]
    pub identity_prefix: String,
}

impl ProducerConfig {
    fn default_endpoint() -> String {
        "tcp://localhost:5590".to_string()
    }

    fn default_identity_prefix() -> String {
        "epiview".to_string()
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            identity_prefix: Self::default_identity_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Complete infrastructure configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraConfig {
    #[serde(default)]
    pub producer: ProducerConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
