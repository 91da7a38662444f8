//! Request statistics.
//!
//! Tracks one [`RequestStatsEntry`] per content key plus process-wide
//! counters (requests, errors, response time, per-client hits) and a capped
//! ring of recent error events. Persistence failures are logged only; no
//! method here returns an error.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use hb_core::{CacheKey, ContentKey, ExternalId, MetaSummary, ResolutionSource};

use crate::document::{decode_record, Document};

/// Default number of items returned by [`StatsStore::recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 100;

/// Upper bound for [`StatsStore::recent`].
pub const MAX_RECENT_LIMIT: usize = 300;

/// Number of error events included in a stats report.
pub const REPORTED_ERRORS: usize = 50;

/// Per-content request counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatsEntry {
    #[serde(rename = "id")]
    pub external_id: ExternalId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "metaId")]
    pub content_id: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub last_requested: Option<DateTime<Utc>>,
    /// Tier that served the latest resolution.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub meta: Option<MetaSummary>,
}

impl RequestStatsEntry {
    fn new(key: &ContentKey) -> Self {
        Self {
            external_id: key.external_id(),
            kind: key.kind.clone(),
            content_id: key.id.clone(),
            count: 0,
            last_requested: None,
            source: String::new(),
            meta: None,
        }
    }

    pub fn content_key(&self) -> ContentKey {
        ContentKey::new(self.kind.clone(), self.content_id.clone())
    }

    pub fn needs_meta(&self) -> bool {
        !self.meta.as_ref().is_some_and(MetaSummary::is_complete)
    }
}

/// A response with status >= 400.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub ip: Option<String>,
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Timing and origin of one processed resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSample {
    pub client: Option<IpAddr>,
    pub elapsed: Duration,
}

/// Aggregates reported next to the recent items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub unique_ips: usize,
    pub total_requests: u64,
    pub total_errors: u64,
    /// Mean response time in whole milliseconds.
    pub avg_response_time: u64,
}

/// The persisted stats document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsDocument {
    pub items: BTreeMap<CacheKey, RequestStatsEntry>,
    pub ip_counts: BTreeMap<String, u64>,
    pub total_requests: u64,
    pub total_errors: u64,
    /// Sum of response times in milliseconds.
    pub total_response_time: u64,
    pub response_samples: u64,
    pub errors: VecDeque<ErrorEvent>,
}

impl StatsDocument {
    pub fn summary(&self) -> StatsSummary {
        let avg_response_time = if self.response_samples > 0 {
            (self.total_response_time as f64 / self.response_samples as f64).round() as u64
        } else {
            0
        };
        StatsSummary {
            unique_ips: self.ip_counts.len(),
            total_requests: self.total_requests,
            total_errors: self.total_errors,
            avg_response_time,
        }
    }
}

/// Read the stats document record by record: a bad item or error event is
/// dropped on its own, and bad counters fall back to zero.
fn load_stats(document: &Document) -> StatsDocument {
    let mut raw: serde_json::Map<String, Value> = document.load();
    let items = raw.remove("items");
    let errors = raw.remove("errors");

    let mut stats: StatsDocument = serde_json::from_value(Value::Object(raw)).unwrap_or_else(|e| {
        tracing::warn!("Unreadable stats counters: {e}; resetting them");
        StatsDocument::default()
    });
    if let Some(Value::Object(items)) = items {
        stats.items = items
            .into_iter()
            .filter_map(|(key, value)| {
                decode_record(&format!("stats item {key}"), value)
                    .map(|entry| (CacheKey::from(key), entry))
            })
            .collect();
    }
    if let Some(Value::Array(errors)) = errors {
        stats.errors = errors
            .into_iter()
            .filter_map(|value| decode_record("error event", value))
            .collect();
    }
    stats
}

/// Persisted request statistics.
#[derive(Debug)]
pub struct StatsStore {
    stats: RwLock<StatsDocument>,
    error_capacity: usize,
    document: Document,
}

impl StatsStore {
    pub fn open(path: Option<PathBuf>, error_capacity: usize) -> Self {
        let document = Document::new(path);
        let mut stats = load_stats(&document);
        while stats.errors.len() > error_capacity {
            stats.errors.pop_front();
        }

        Self {
            stats: RwLock::new(stats),
            error_capacity,
            document,
        }
    }

    pub fn in_memory(error_capacity: usize) -> Self {
        Self::open(None, error_capacity)
    }

    /// Count one processed resolution of `key`.
    ///
    /// Returns the updated entry so callers can decide whether it still needs
    /// metadata.
    pub async fn record(
        &self,
        key: &ContentKey,
        source: ResolutionSource,
        sample: RequestSample,
    ) -> RequestStatsEntry {
        let writer = self.document.lock().await;
        let (entry, snapshot) = {
            let mut stats = self.stats.write();

            let entry = stats
                .items
                .entry(key.cache_key())
                .or_insert_with(|| RequestStatsEntry::new(key));
            entry.count += 1;
            entry.last_requested = Some(Utc::now());
            entry.source = source.to_string();
            let entry = entry.clone();

            stats.total_requests += 1;
            stats.total_response_time += sample.elapsed.as_millis() as u64;
            stats.response_samples += 1;
            if let Some(client) = sample.client {
                *stats.ip_counts.entry(client.to_string()).or_insert(0) += 1;
            }

            (entry, serde_json::to_string_pretty(&*stats))
        };
        writer.persist(snapshot).await;
        entry
    }

    /// Count a failed HTTP response and remember it in the error ring.
    pub async fn record_error(&self, event: ErrorEvent) {
        let writer = self.document.lock().await;
        let snapshot = {
            let mut stats = self.stats.write();
            stats.total_errors += 1;
            stats.errors.push_back(event);
            while stats.errors.len() > self.error_capacity {
                stats.errors.pop_front();
            }
            serde_json::to_string_pretty(&*stats)
        };
        writer.persist(snapshot).await;
    }

    /// Decorate an item with metadata if it still lacks it.
    pub async fn attach_meta(&self, key: &CacheKey, meta: MetaSummary) -> bool {
        let writer = self.document.lock().await;
        let snapshot = {
            let mut stats = self.stats.write();
            match stats.items.get_mut(key) {
                Some(entry) if entry.needs_meta() => {
                    entry.meta = Some(meta);
                    serde_json::to_string_pretty(&*stats)
                }
                _ => return false,
            }
        };
        writer.persist(snapshot).await;
        true
    }

    pub fn get(&self, key: &CacheKey) -> Option<RequestStatsEntry> {
        self.stats.read().items.get(key).cloned()
    }

    /// Up to `limit` items, most recently requested first. `limit` is clamped
    /// to [`MAX_RECENT_LIMIT`].
    pub fn recent(&self, limit: usize) -> Vec<RequestStatsEntry> {
        let mut items: Vec<RequestStatsEntry> = self
            .stats
            .read()
            .items
            .values()
            .filter(|item| !item.content_id.is_empty())
            .cloned()
            .collect();
        items.sort_by(|a, b| b.last_requested.cmp(&a.last_requested));
        items.truncate(limit.min(MAX_RECENT_LIMIT));
        items
    }

    pub fn summary(&self) -> StatsSummary {
        self.stats.read().summary()
    }

    /// Up to `limit` error events, newest first.
    pub fn errors(&self, limit: usize) -> Vec<ErrorEvent> {
        self.stats
            .read()
            .errors
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Full copy of the current document.
    pub fn snapshot(&self) -> StatsDocument {
        self.stats.read().clone()
    }

    /// Reset every counter.
    pub async fn clear(&self) {
        let writer = self.document.lock().await;
        let snapshot = {
            let mut stats = self.stats.write();
            *stats = StatsDocument::default();
            serde_json::to_string_pretty(&*stats)
        };
        writer.persist(snapshot).await;
    }
}
