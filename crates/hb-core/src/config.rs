//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! sub-configs for the server, resolver, metadata lookups, telemetry and the
//! event log. Every section defaults sensibly so a completely empty `{}` file
//! is valid.
//!
//! Provider credentials are not part of this file; they live in the
//! runtime settings document editable through the admin API.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub metadata: MetadataConfig,
    pub telemetry: TelemetryConfig,
    pub logs: LogConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.server.data_dir.as_os_str().is_empty() {
            warnings.push("server.data_dir is empty; documents go to the working directory".into());
        }

        if self.resolver.provider_timeout_secs == 0 {
            warnings.push("resolver.provider_timeout_secs is 0; every provider call will time out".into());
        }

        if self.metadata.timeout_secs == 0 {
            warnings.push("metadata.timeout_secs is 0; metadata lookups will always fail".into());
        }

        if self.metadata.requests_per_second == 0 {
            warnings.push("metadata.requests_per_second is 0; falling back to 1".into());
        }

        for (name, value) in [
            ("metadata.api_base_url", &self.metadata.api_base_url),
            ("metadata.poster_base_url", &self.metadata.poster_base_url),
            ("metadata.backdrop_base_url", &self.metadata.backdrop_base_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                warnings.push(format!("{name} '{value}' is not an http(s) URL"));
            }
        }

        if self.telemetry.error_capacity == 0 {
            warnings.push("telemetry.error_capacity is 0; no error events will be kept".into());
        }

        if self.logs.capacity == 0 {
            warnings.push("logs.capacity is 0; the event log will stay empty".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the persisted JSON documents.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 51300,
            data_dir: PathBuf::from("Confidential"),
        }
    }
}

/// Fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Timeout applied to each individual provider request.
    pub provider_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 8,
        }
    }
}

impl ResolverConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// TMDB endpoints and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub api_base_url: String,
    pub poster_base_url: String,
    pub backdrop_base_url: String,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.themoviedb.org/3".into(),
            poster_base_url: "https://image.tmdb.org/t/p/w342".into(),
            backdrop_base_url: "https://image.tmdb.org/t/p/original".into(),
            timeout_secs: 6,
            requests_per_second: 20,
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// How many recent error events to retain.
    pub error_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            error_capacity: 200,
        }
    }
}

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum number of retained log entries.
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}
