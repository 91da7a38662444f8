//! Unified error type for hubbio.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`].

use std::fmt;
use std::path::PathBuf;

/// Unified error type covering all failure modes in hubbio.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An upstream provider could not be reached (network error, timeout,
    /// non-success status).
    #[error("Provider unreachable [{provider}]: {reason}")]
    ProviderUnreachable {
        /// Provider name or manifest URL.
        provider: String,
        /// Human-readable error description.
        reason: String,
    },

    /// An upstream provider answered with a payload that is not a stream
    /// document.
    #[error("Provider malformed [{provider}]: {reason}")]
    ProviderMalformed {
        /// Provider name or manifest URL.
        provider: String,
        /// Human-readable error description.
        reason: String,
    },

    /// A durable document could not be written.
    #[error("Persistence write failed for {}: {reason}", .path.display())]
    PersistenceWriteFailed {
        /// The document that failed to persist.
        path: PathBuf,
        /// Human-readable error description.
        reason: String,
    },

    /// No metadata capability is configured, or the lookup failed.
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "cache entry", "addon").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::ProviderUnreachable { .. } => 502,
            Error::ProviderMalformed { .. } => 502,
            Error::PersistenceWriteFailed { .. } => 500,
            Error::MetadataUnavailable(_) => 503,
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Io { .. } => 500,
            Error::Json { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ProviderUnreachable { .. } => "provider_unreachable",
            Error::ProviderMalformed { .. } => "provider_malformed",
            Error::PersistenceWriteFailed { .. } => "persistence_write_failed",
            Error::MetadataUnavailable(_) => "metadata_unavailable",
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Io { .. } => "io_error",
            Error::Json { .. } => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Convenience constructor for [`Error::ProviderUnreachable`].
    pub fn unreachable(provider: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::ProviderUnreachable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for [`Error::ProviderMalformed`].
    pub fn malformed(provider: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::ProviderMalformed {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for [`Error::PersistenceWriteFailed`].
    pub fn persistence(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::PersistenceWriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the per-provider failure kinds the aggregator absorbs.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnreachable { .. } | Error::ProviderMalformed { .. }
        )
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("cache entry", "abc-123");
        assert_eq!(err.to_string(), "cache entry not found: abc-123");
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn validation_display() {
        let err = Error::validation("Empty URL");
        assert_eq!(err.to_string(), "Validation error: Empty URL");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn provider_unreachable_display() {
        let err = Error::unreachable("Torrentio", "HTTP 503");
        assert_eq!(err.to_string(), "Provider unreachable [Torrentio]: HTTP 503");
        assert_eq!(err.http_status(), 502);
        assert!(err.is_provider_failure());
    }

    #[test]
    fn provider_malformed_display() {
        let err = Error::malformed("Torrentio", "missing streams array");
        assert_eq!(
            err.to_string(),
            "Provider malformed [Torrentio]: missing streams array"
        );
        assert!(err.is_provider_failure());
    }

    #[test]
    fn persistence_display() {
        let err = Error::persistence("/data/logs.json", "read-only file system");
        assert_eq!(
            err.to_string(),
            "Persistence write failed for /data/logs.json: read-only file system"
        );
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_provider_failure());
    }

    #[test]
    fn metadata_unavailable_display() {
        let err = Error::MetadataUnavailable("no TMDB key configured".into());
        assert_eq!(
            err.to_string(),
            "Metadata unavailable: no TMDB key configured"
        );
        assert_eq!(err.http_status(), 503);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn json_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(serde_err);
        assert!(matches!(err, Error::Json { .. }));
        assert_eq!(err.code(), "json_error");
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(Error::Internal("boom".into()))
        }
        assert!(err_fn().is_err());
    }
}
