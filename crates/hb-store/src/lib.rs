//! hb-store: document-backed state for the resolver.
//!
//! Each store owns its in-memory state and a single JSON document that is
//! rewritten after every mutation. Missing or corrupt documents load as empty
//! stores; write failures are logged and never surface to callers.

pub mod cache;
pub mod document;
pub mod logs;
pub mod providers;
pub mod settings;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hb_core::config::Config;

pub use cache::{CacheEntry, CacheStore};
pub use logs::{EventKind, EventLog, LogEntry};
pub use providers::{ProviderRegistry, Registration};
pub use settings::{CredentialsUpdate, ProviderCredentials, SettingsStore};
pub use stats::{ErrorEvent, RequestSample, RequestStatsEntry, StatsStore, StatsSummary};

/// File names of the persisted documents inside the data directory.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub cache: PathBuf,
    pub stats: PathBuf,
    pub logs: PathBuf,
    pub providers: PathBuf,
    pub settings: PathBuf,
}

impl StorePaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            cache: data_dir.join("streams-cache.json"),
            stats: data_dir.join("stats.json"),
            logs: data_dir.join("logs.json"),
            providers: data_dir.join("addons.json"),
            settings: data_dir.join("config.json"),
        }
    }
}

/// Every store the resolver and admin API share.
#[derive(Debug, Clone)]
pub struct Stores {
    pub cache: Arc<CacheStore>,
    pub stats: Arc<StatsStore>,
    pub logs: Arc<EventLog>,
    pub providers: Arc<ProviderRegistry>,
    pub settings: Arc<SettingsStore>,
}

impl Stores {
    /// Open all documents under `data_dir`.
    pub fn open(data_dir: &Path, config: &Config) -> Self {
        let paths = StorePaths::new(data_dir);
        tracing::info!("Using data directory {}", data_dir.display());
        Self {
            cache: Arc::new(CacheStore::open(Some(paths.cache))),
            stats: Arc::new(StatsStore::open(
                Some(paths.stats),
                config.telemetry.error_capacity,
            )),
            logs: Arc::new(EventLog::open(Some(paths.logs), config.logs.capacity)),
            providers: Arc::new(ProviderRegistry::open(Some(paths.providers))),
            settings: Arc::new(SettingsStore::open(Some(paths.settings))),
        }
    }

    /// Stores that never touch the filesystem.
    pub fn in_memory(config: &Config) -> Self {
        Self {
            cache: Arc::new(CacheStore::in_memory()),
            stats: Arc::new(StatsStore::in_memory(config.telemetry.error_capacity)),
            logs: Arc::new(EventLog::in_memory(config.logs.capacity)),
            providers: Arc::new(ProviderRegistry::in_memory()),
            settings: Arc::new(SettingsStore::in_memory()),
        }
    }
}
