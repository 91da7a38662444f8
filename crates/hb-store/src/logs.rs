//! Bounded diagnostic event log.
//!
//! [`EventLog`] keeps the most recent entries in a ring buffer, evicting the
//! oldest on overflow, and rewrites its document after every append.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::document::{decode_record, Document};

/// Default number of entries returned by [`EventLog::recent`].
pub const DEFAULT_LIST_LIMIT: usize = 200;

/// Upper bound for [`EventLog::recent`].
pub const MAX_LIST_LIMIT: usize = 500;

/// What happened. Serialized as the entry's kebab-case `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CacheHit,
    StreamRequest,
    AddonStreams,
    AddonError,
    CacheStore,
    StreamsMiss,
    AddonAdd,
    AddonExists,
    AddonRemove,
    CacheRemove,
    CacheStreamRemove,
    ConfigUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache-hit",
            Self::StreamRequest => "stream-request",
            Self::AddonStreams => "addon-streams",
            Self::AddonError => "addon-error",
            Self::CacheStore => "cache-store",
            Self::StreamsMiss => "streams-miss",
            Self::AddonAdd => "addon-add",
            Self::AddonExists => "addon-exists",
            Self::AddonRemove => "addon-remove",
            Self::CacheRemove => "cache-remove",
            Self::CacheStreamRemove => "cache-stream-remove",
            Self::ConfigUpdate => "config-update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic record.
///
/// `kind` stays a plain string so entries written by other tools survive a
/// load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub meta: Value,
    #[serde(rename = "ts", alias = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Fixed-capacity, persisted FIFO of [`LogEntry`] values.
#[derive(Debug)]
pub struct EventLog {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
    document: Document,
}

impl EventLog {
    /// Load the log from `path`, keeping only the newest `capacity` entries.
    /// Entries that no longer parse are dropped one by one.
    pub fn open(path: Option<PathBuf>, capacity: usize) -> Self {
        let document = Document::new(path);
        let raw: Vec<Value> = document.load();
        let mut entries: VecDeque<LogEntry> = raw
            .into_iter()
            .filter_map(|value| decode_record("log entry", value))
            .collect();
        while entries.len() > capacity {
            entries.pop_front();
        }

        Self {
            entries: RwLock::new(entries),
            capacity,
            document,
        }
    }

    pub fn in_memory(capacity: usize) -> Self {
        Self::open(None, capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting the oldest when full, and persist.
    pub async fn append(&self, kind: EventKind, message: &str, meta: Value) -> LogEntry {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            kind: kind.as_str().to_owned(),
            message: message.to_owned(),
            meta,
            timestamp: Utc::now(),
        };
        tracing::debug!(kind = %kind, "{message}");

        let writer = self.document.lock().await;
        let snapshot = {
            let mut entries = self.entries.write();
            entries.push_back(entry.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
            serde_json::to_string_pretty(&*entries)
        };
        writer.persist(snapshot).await;
        entry
    }

    /// Up to `limit` entries, newest first. `limit` is clamped to
    /// [`MAX_LIST_LIMIT`].
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries
            .read()
            .iter()
            .rev()
            .take(limit.min(MAX_LIST_LIMIT))
            .cloned()
            .collect()
    }

    /// Every retained entry, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub async fn clear(&self) {
        let writer = self.document.lock().await;
        let snapshot = {
            let mut entries = self.entries.write();
            entries.clear();
            serde_json::to_string_pretty(&*entries)
        };
        writer.persist(snapshot).await;
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
