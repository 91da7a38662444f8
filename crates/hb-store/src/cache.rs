//! Durable stream cache.
//!
//! Maps each [`CacheKey`] to the streams last aggregated for it. Entries are
//! created or fully replaced on a successful aggregation and removed only by
//! administrative action; the whole map is rewritten to disk after every
//! mutation.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use hb_core::{CacheKey, ContentKey, Error, ExternalId, MetaSummary, Result, StreamDescriptor};

use crate::document::{decode_record, Document};

/// Cached streams for one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(rename = "id")]
    pub external_id: ExternalId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "metaId")]
    pub content_id: String,
    pub streams: Vec<StreamDescriptor>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub meta: Option<MetaSummary>,
}

impl CacheEntry {
    /// A fresh entry stamped with the current time and no metadata.
    pub fn new(key: &ContentKey, streams: Vec<StreamDescriptor>) -> Self {
        Self {
            external_id: key.external_id(),
            kind: key.kind.clone(),
            content_id: key.id.clone(),
            streams,
            updated_at: Utc::now(),
            meta: None,
        }
    }

    pub fn content_key(&self) -> ContentKey {
        ContentKey::new(self.kind.clone(), self.content_id.clone())
    }

    /// True if `id` is the stored external id or the one derived from the
    /// entry's content key.
    pub fn matches_external_id(&self, id: &str) -> bool {
        self.external_id.as_str() == id || self.content_key().external_id().as_str() == id
    }

    pub fn needs_meta(&self) -> bool {
        !self.meta.as_ref().is_some_and(MetaSummary::is_complete)
    }
}

/// Key-to-entry map with whole-document persistence.
#[derive(Debug)]
pub struct CacheStore {
    entries: RwLock<BTreeMap<CacheKey, CacheEntry>>,
    document: Document,
}

impl CacheStore {
    /// Load the store from `path`, or start empty when the document is
    /// missing or corrupt. Individual unparseable entries are skipped.
    pub fn open(path: Option<PathBuf>) -> Self {
        let document = Document::new(path);
        let raw: BTreeMap<CacheKey, serde_json::Value> = document.load();

        let entries: BTreeMap<CacheKey, CacheEntry> = raw
            .into_iter()
            .filter_map(|(key, value)| {
                decode_record(&format!("cache entry {key}"), value).map(|entry| (key, entry))
            })
            .collect();

        if !entries.is_empty() {
            tracing::info!("Loaded {} cached stream entries", entries.len());
        }

        Self {
            entries: RwLock::new(entries),
            document,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(None)
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Store `entry` under `key`, replacing anything already there.
    ///
    /// An empty stream list is refused: only non-empty aggregations are cached.
    pub async fn put(&self, key: CacheKey, mut entry: CacheEntry) -> Result<()> {
        if entry.streams.is_empty() {
            return Err(Error::validation(format!(
                "refusing to cache an empty stream list for {key}"
            )));
        }
        entry.updated_at = Utc::now();

        let writer = self.document.lock().await;
        let snapshot = {
            let mut entries = self.entries.write();
            entries.insert(key, entry);
            serde_json::to_string_pretty(&*entries)
        };
        writer.persist(snapshot).await;
        Ok(())
    }

    /// Remove the whole entry for `key`.
    pub async fn delete(&self, key: &CacheKey) -> Result<CacheEntry> {
        let writer = self.document.lock().await;
        let (removed, snapshot) = {
            let mut entries = self.entries.write();
            let removed = entries
                .remove(key)
                .ok_or_else(|| Error::not_found("cache entry", key))?;
            (removed, serde_json::to_string_pretty(&*entries))
        };
        writer.persist(snapshot).await;
        Ok(removed)
    }

    /// Remove one stream by position, refreshing `updatedAt`.
    ///
    /// Returns the entry as it stands afterwards. Removing the last stream
    /// drops the entry altogether, so the next resolution aggregates again.
    pub async fn delete_stream(&self, key: &CacheKey, index: usize) -> Result<CacheEntry> {
        let writer = self.document.lock().await;
        let (updated, snapshot) = {
            let mut entries = self.entries.write();
            let entry = entries
                .get_mut(key)
                .ok_or_else(|| Error::not_found("cache entry", key))?;
            if index >= entry.streams.len() {
                return Err(Error::not_found("stream", format!("{key}#{index}")));
            }
            entry.streams.remove(index);
            entry.updated_at = Utc::now();

            let updated = entry.clone();
            if updated.streams.is_empty() {
                entries.remove(key);
            }
            (updated, serde_json::to_string_pretty(&*entries))
        };
        writer.persist(snapshot).await;
        Ok(updated)
    }

    /// Decorate an entry with metadata if it still exists and still lacks
    /// it. Returns whether anything changed.
    pub async fn attach_meta(&self, key: &CacheKey, meta: MetaSummary) -> bool {
        let writer = self.document.lock().await;
        let snapshot = {
            let mut entries = self.entries.write();
            match entries.get_mut(key) {
                Some(entry) if entry.needs_meta() => {
                    entry.meta = Some(meta);
                    serde_json::to_string_pretty(&*entries)
                }
                _ => return false,
            }
        };
        writer.persist(snapshot).await;
        true
    }

    /// Find an entry by its external id.
    pub fn find(&self, external_id: &str) -> Option<(CacheKey, CacheEntry)> {
        self.entries
            .read()
            .iter()
            .find(|(_, entry)| entry.matches_external_id(external_id))
            .map(|(key, entry)| (key.clone(), entry.clone()))
    }

    /// Snapshot of every entry, ordered by key.
    pub fn list(&self) -> Vec<(CacheKey, CacheEntry)> {
        self.entries
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(n: usize) -> Vec<StreamDescriptor> {
        (0..n)
            .map(|i| StreamDescriptor::new(format!("s{i}"), format!("https://cdn/{i}.mp4")))
            .collect()
    }

    fn movie() -> ContentKey {
        ContentKey::new("movie", "tt0111161")
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = CacheStore::in_memory();
        let key = movie();
        assert!(store.get(&key.cache_key()).is_none());

        store
            .put(key.cache_key(), CacheEntry::new(&key, streams(2)))
            .await
            .unwrap();

        let entry = store.get(&key.cache_key()).unwrap();
        assert_eq!(entry.streams, streams(2));
        assert_eq!(entry.external_id, key.external_id());
        assert_eq!(entry.content_key(), key);
    }

    #[tokio::test]
    async fn put_replaces_instead_of_merging() {
        let store = CacheStore::in_memory();
        let key = movie();
        store.put(key.cache_key(), CacheEntry::new(&key, streams(3))).await.unwrap();

        let replacement = vec![StreamDescriptor::new("only", "https://cdn/only.mp4")];
        store
            .put(key.cache_key(), CacheEntry::new(&key, replacement.clone()))
            .await
            .unwrap();

        assert_eq!(store.get(&key.cache_key()).unwrap().streams, replacement);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_refuses_empty_streams() {
        let store = CacheStore::in_memory();
        let key = movie();
        let err = store
            .put(key.cache_key(), CacheEntry::new(&key, Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = CacheStore::in_memory();
        let err = store.delete(&movie().cache_key()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_stream_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams-cache.json");
        let key = movie();
        let mut entry = CacheEntry::new(&key, streams(3));
        entry.updated_at = Utc::now() - chrono::Duration::hours(1);
        let stale = entry.updated_at;
        let doc = BTreeMap::from([(key.cache_key(), entry)]);
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let store = CacheStore::open(Some(path));
        assert_eq!(store.get(&key.cache_key()).unwrap().updated_at, stale);

        let updated = store.delete_stream(&key.cache_key(), 1).await.unwrap();
        assert_eq!(updated.streams.len(), 2);
        assert_eq!(updated.streams[0].title, "s0");
        assert_eq!(updated.streams[1].title, "s2");
        assert!(updated.updated_at > stale + chrono::Duration::minutes(59));
        assert_eq!(store.get(&key.cache_key()).unwrap(), updated);
    }

    #[tokio::test]
    async fn delete_stream_out_of_range_is_not_found() {
        let store = CacheStore::in_memory();
        let key = movie();
        store.put(key.cache_key(), CacheEntry::new(&key, streams(2))).await.unwrap();

        let err = store.delete_stream(&key.cache_key(), 2).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(store.get(&key.cache_key()).unwrap().streams.len(), 2);
    }

    #[tokio::test]
    async fn deleting_last_stream_drops_entry() {
        let store = CacheStore::in_memory();
        let key = movie();
        store.put(key.cache_key(), CacheEntry::new(&key, streams(1))).await.unwrap();

        let updated = store.delete_stream(&key.cache_key(), 0).await.unwrap();
        assert!(updated.streams.is_empty());
        assert!(store.get(&key.cache_key()).is_none());
    }

    #[tokio::test]
    async fn find_by_stored_or_derived_id() {
        let store = CacheStore::in_memory();
        let key = movie();
        let mut entry = CacheEntry::new(&key, streams(1));
        entry.external_id = ExternalId::from("hand-edited");
        store.put(key.cache_key(), entry).await.unwrap();

        assert!(store.find("hand-edited").is_some());
        assert!(store.find(key.external_id().as_str()).is_some());
        assert!(store.find("nope").is_none());
    }

    #[tokio::test]
    async fn attach_meta_only_when_missing() {
        let store = CacheStore::in_memory();
        let key = movie();
        store.put(key.cache_key(), CacheEntry::new(&key, streams(1))).await.unwrap();

        let first = MetaSummary { title: "The Shawshank Redemption".into(), poster: None };
        let second = MetaSummary { title: "Other".into(), poster: None };
        assert!(store.attach_meta(&key.cache_key(), first.clone()).await);
        assert!(!store.attach_meta(&key.cache_key(), second).await);
        assert_eq!(store.get(&key.cache_key()).unwrap().meta, Some(first));

        let missing = ContentKey::new("movie", "gone").cache_key();
        assert!(!store.attach_meta(&missing, MetaSummary { title: "x".into(), poster: None }).await);
    }

    #[tokio::test]
    async fn persists_and_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams-cache.json");

        let store = CacheStore::open(Some(path.clone()));
        let a = movie();
        let b = ContentKey::new("series", "tt0903747:1:1");
        store.put(a.cache_key(), CacheEntry::new(&a, streams(2))).await.unwrap();
        store.put(b.cache_key(), CacheEntry::new(&b, streams(1))).await.unwrap();
        store.delete_stream(&a.cache_key(), 0).await.unwrap();

        let reloaded = CacheStore::open(Some(path.clone()));
        assert_eq!(reloaded.list(), store.list());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let doc = &raw["movie:tt0111161"];
        assert_eq!(doc["metaId"], "tt0111161");
        assert_eq!(doc["type"], "movie");
        assert!(doc["updatedAt"].is_string());
    }

    #[test]
    fn skips_unreadable_entries_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams-cache.json");
        std::fs::write(
            &path,
            r#"{
                "movie:1": {"id": "x", "type": "movie", "metaId": "1", "streams": [{"title": "a", "url": "u"}], "updatedAt": "2024-01-01T00:00:00Z"},
                "movie:2": {"streams": "not a list"}
            }"#,
        )
        .unwrap();

        let store = CacheStore::open(Some(path));
        assert_eq!(store.len(), 1);
        assert!(store.get(&CacheKey::from("movie:1")).is_some());
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_and_next_mutation_retries() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be.
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("streams-cache.json");
        let store = CacheStore::open(Some(path.clone()));

        let a = movie();
        store.put(a.cache_key(), CacheEntry::new(&a, streams(2))).await.unwrap();
        assert_eq!(store.get(&a.cache_key()).unwrap().streams.len(), 2);
        assert!(!path.exists());

        std::fs::remove_file(&blocker).unwrap();
        let b = ContentKey::new("series", "tt0903747:1:1");
        store.put(b.cache_key(), CacheEntry::new(&b, streams(1))).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.as_object().unwrap().len(), 2);
        assert_eq!(raw["movie:tt0111161"]["streams"].as_array().unwrap().len(), 2);
        assert_eq!(CacheStore::open(Some(path)).list(), store.list());
    }
}
