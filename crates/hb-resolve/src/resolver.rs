//! Three-tier stream resolution: cache, provider fan-out, fallback.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;

use hb_core::{ContentKey, ResolutionSource, StreamDescriptor};
use hb_store::{CacheEntry, CacheStore, EventKind, EventLog, ProviderRegistry, RequestSample, Stores};

use crate::aggregator::Aggregator;
use crate::enricher::Enricher;
use crate::fallback::FallbackCatalog;
use crate::source::StreamSource;
use crate::telemetry::Telemetry;

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub source: ResolutionSource,
    pub streams: Vec<StreamDescriptor>,
}

/// Answers stream queries for a content key.
pub struct Resolver {
    cache: Arc<CacheStore>,
    providers: Arc<ProviderRegistry>,
    log: Arc<EventLog>,
    aggregator: Aggregator,
    fallback: FallbackCatalog,
    enricher: Enricher,
    telemetry: Telemetry,
}

impl Resolver {
    pub fn new(
        stores: &Stores,
        source: Arc<dyn StreamSource>,
        enricher: Enricher,
        fallback: FallbackCatalog,
    ) -> Self {
        Self {
            cache: stores.cache.clone(),
            providers: stores.providers.clone(),
            log: stores.logs.clone(),
            aggregator: Aggregator::new(source, stores.logs.clone()),
            fallback,
            telemetry: Telemetry::new(stores.stats.clone(), enricher.clone()),
            enricher,
        }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Resolve `key`, recording the request against `client`.
    ///
    /// Always produces an answer. Provider failures only shrink the merged
    /// result; an empty result with [`ResolutionSource::Empty`] is possible
    /// when the fallback catalog has nothing either.
    pub async fn resolve(&self, key: &ContentKey, client: Option<IpAddr>) -> Resolution {
        let started = Instant::now();
        let resolution = self.lookup(key).await;
        tracing::debug!(
            key = %key,
            source = %resolution.source,
            streams = resolution.streams.len(),
            "Resolved streams"
        );
        self.telemetry
            .record(
                key,
                resolution.source,
                RequestSample {
                    client,
                    elapsed: started.elapsed(),
                },
            )
            .await;
        resolution
    }

    /// Resolve `key` on its own task so that dropping the caller, for
    /// instance when an HTTP client disconnects, does not abandon the
    /// fan-out halfway. Caching, logging and stats still happen.
    pub async fn resolve_detached(
        self: Arc<Self>,
        key: ContentKey,
        client: Option<IpAddr>,
    ) -> Resolution {
        let label = key.to_string();
        let task = tokio::spawn(async move { self.resolve(&key, client).await });
        match task.await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!(key = %label, "Resolution task failed: {e}");
                Resolution {
                    source: ResolutionSource::Empty,
                    streams: Vec::new(),
                }
            }
        }
    }

    async fn lookup(&self, key: &ContentKey) -> Resolution {
        let cache_key = key.cache_key();

        if let Some(entry) = self.cache.get(&cache_key).filter(|e| !e.streams.is_empty()) {
            self.log
                .append(
                    EventKind::CacheHit,
                    &format!("Cache hit for {key}"),
                    json!({"type": key.kind, "id": key.id, "streams": entry.streams.len()}),
                )
                .await;
            return Resolution {
                source: ResolutionSource::Cache,
                streams: entry.streams,
            };
        }

        let providers = self.providers.list();
        self.log
            .append(
                EventKind::StreamRequest,
                &format!("Resolving {key} across {} addon(s)", providers.len()),
                json!({"type": key.kind, "id": key.id, "addons": providers.len()}),
            )
            .await;

        let streams = self.aggregator.resolve(key, &providers).await;
        if !streams.is_empty() {
            self.store(key, &streams).await;
            return Resolution {
                source: ResolutionSource::Addons,
                streams,
            };
        }

        let streams = self.fallback.streams_for(key);
        if streams.is_empty() {
            self.log
                .append(
                    EventKind::StreamsMiss,
                    &format!("No streams for {key}"),
                    json!({"type": key.kind, "id": key.id}),
                )
                .await;
            return Resolution {
                source: ResolutionSource::Empty,
                streams,
            };
        }
        Resolution {
            source: ResolutionSource::Demo,
            streams,
        }
    }

    async fn store(&self, key: &ContentKey, streams: &[StreamDescriptor]) {
        let entry = CacheEntry::new(key, streams.to_vec());
        if let Err(e) = self.cache.put(key.cache_key(), entry).await {
            tracing::warn!(key = %key, "Failed to cache streams: {e}");
            return;
        }
        self.log
            .append(
                EventKind::CacheStore,
                &format!("Cached {} stream(s) for {key}", streams.len()),
                json!({"type": key.kind, "id": key.id, "streams": streams.len()}),
            )
            .await;
        self.schedule_cache_meta(key);
    }

    /// Decorate the cache entry for `key` in the background.
    pub fn schedule_cache_meta(&self, key: &ContentKey) -> Option<JoinHandle<()>> {
        let cache = self.cache.clone();
        let cache_key = key.cache_key();
        self.enricher
            .spawn_attach(key.clone(), move |meta| async move {
                cache.attach_meta(&cache_key, meta).await
            })
    }

    /// Start enrichment for every cache entry still lacking metadata.
    pub fn schedule_missing_cache_meta(&self) -> Vec<JoinHandle<()>> {
        self.cache
            .list()
            .into_iter()
            .filter(|(_, entry)| entry.needs_meta())
            .filter_map(|(_, entry)| self.schedule_cache_meta(&entry.content_key()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedSource, StaticMetadata};
    use hb_core::config::Config;
    use std::time::Duration;

    fn stores() -> Stores {
        Stores::in_memory(&Config::default())
    }

    async fn register(stores: &Stores, name: &str) {
        stores
            .providers
            .add(&format!("https://{name}.example/manifest.json"), Some(name.into()), None)
            .await
            .unwrap();
    }

    fn kinds(log: &EventLog) -> Vec<String> {
        log.entries().into_iter().map(|e| e.kind).collect()
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let stores = stores();
        register(&stores, "one").await;
        let source = Arc::new(ScriptedSource::default().respond("one", &["a", "b"]));
        let resolver = Resolver::new(&stores, source.clone(), Enricher::disabled(), FallbackCatalog::default());
        let key = ContentKey::new("movie", "tt1");

        let first = resolver.resolve(&key, None).await;
        assert_eq!(first.source, ResolutionSource::Addons);
        assert_eq!(first.streams.len(), 2);
        assert_eq!(source.calls(), 1);

        let second = resolver.resolve(&key, None).await;
        assert_eq!(second.source, ResolutionSource::Cache);
        assert_eq!(second.streams, first.streams);
        assert_eq!(source.calls(), 1);

        assert_eq!(
            kinds(&stores.logs),
            ["stream-request", "addon-streams", "cache-store", "cache-hit"]
        );
        let stats = stores.stats.get(&key.cache_key()).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.source, "cache");
    }

    #[tokio::test]
    async fn all_providers_failing_uses_fallback() {
        let stores = stores();
        register(&stores, "down").await;
        let source = Arc::new(ScriptedSource::default().fail("down"));
        let resolver = Resolver::new(&stores, source, Enricher::disabled(), FallbackCatalog::default());

        let res = resolver
            .resolve(&ContentKey::new("movie", "hubbio:sample-movie"), None)
            .await;
        assert_eq!(res.source, ResolutionSource::Demo);
        assert_eq!(res.streams[0].title, "Hubbio Sample (MP4)");
        assert!(stores.cache.is_empty());
    }

    #[tokio::test]
    async fn fallback_is_not_cached() {
        let stores = stores();
        let source = Arc::new(ScriptedSource::default());
        let resolver = Resolver::new(&stores, source, Enricher::disabled(), FallbackCatalog::default());
        let key = ContentKey::new("movie", "tt9");

        assert_eq!(resolver.resolve(&key, None).await.source, ResolutionSource::Demo);
        assert_eq!(resolver.resolve(&key, None).await.source, ResolutionSource::Demo);
        assert!(stores.cache.get(&key.cache_key()).is_none());
    }

    #[tokio::test]
    async fn empty_fallback_reports_empty() {
        let stores = stores();
        let resolver = Resolver::new(
            &stores,
            Arc::new(ScriptedSource::default()),
            Enricher::disabled(),
            FallbackCatalog::empty(),
        );
        let key = ContentKey::new("movie", "tt9");
        let res = resolver.resolve(&key, None).await;
        assert_eq!(res.source, ResolutionSource::Empty);
        assert!(res.streams.is_empty());
        assert_eq!(kinds(&stores.logs), ["stream-request", "streams-miss"]);
        assert_eq!(stores.stats.get(&key.cache_key()).unwrap().source, "empty");
    }

    #[tokio::test]
    async fn type_is_part_of_the_key() {
        let stores = stores();
        register(&stores, "one").await;
        let source = Arc::new(ScriptedSource::default().respond("one", &["a"]));
        let resolver = Resolver::new(&stores, source.clone(), Enricher::disabled(), FallbackCatalog::default());

        resolver.resolve(&ContentKey::new("movie", "tt1"), None).await;
        let res = resolver.resolve(&ContentKey::new("series", "tt1"), None).await;
        assert_eq!(res.source, ResolutionSource::Addons);
        assert_eq!(source.calls(), 2);
        assert_eq!(stores.cache.len(), 2);
    }

    #[tokio::test]
    async fn slow_provider_does_not_block_others() {
        let stores = stores();
        register(&stores, "slow").await;
        register(&stores, "fast").await;
        let source = Arc::new(
            ScriptedSource::default()
                .fail("slow")
                .respond_after("fast", Duration::from_millis(10), &["f"]),
        );
        let resolver = Resolver::new(&stores, source, Enricher::disabled(), FallbackCatalog::default());

        let res = resolver.resolve(&ContentKey::new("movie", "tt1"), None).await;
        assert_eq!(res.source, ResolutionSource::Addons);
        assert_eq!(res.streams[0].title, "f");
    }

    #[tokio::test]
    async fn cached_entry_gets_metadata() {
        let stores = stores();
        register(&stores, "one").await;
        let source = Arc::new(ScriptedSource::default().respond("one", &["a"]));
        let enricher = Enricher::with_provider(Arc::new(StaticMetadata::titled("Heat")));
        let resolver = Resolver::new(&stores, source, enricher, FallbackCatalog::default());
        let key = ContentKey::new("movie", "tt1");

        resolver.resolve(&key, None).await;
        for task in resolver.schedule_missing_cache_meta() {
            task.await.unwrap();
        }
        let entry = stores.cache.get(&key.cache_key()).unwrap();
        assert_eq!(entry.meta.unwrap().title, "Heat");
    }

    #[tokio::test]
    async fn detached_resolution_survives_a_dropped_caller() {
        let stores = stores();
        register(&stores, "slow").await;
        let source = Arc::new(
            ScriptedSource::default().respond_after("slow", Duration::from_millis(100), &["late"]),
        );
        let resolver = Arc::new(Resolver::new(
            &stores,
            source,
            Enricher::disabled(),
            FallbackCatalog::default(),
        ));
        let key = ContentKey::new("movie", "tt77");

        let caller = tokio::spawn(resolver.clone().resolve_detached(key.clone(), None));
        tokio::time::sleep(Duration::from_millis(20)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let entry = stores.cache.get(&key.cache_key()).unwrap();
        assert_eq!(entry.streams[0].title, "late");
        assert_eq!(stores.stats.summary().total_requests, 1);
        assert_eq!(
            kinds(&stores.logs),
            ["stream-request", "addon-streams", "cache-store"]
        );
    }

    #[tokio::test]
    async fn unwritable_data_dir_still_resolves_from_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be.
        let blocked = dir.path().join("data");
        std::fs::write(&blocked, "x").unwrap();
        let stores = Stores::open(&blocked, &Config::default());
        register(&stores, "one").await;
        let source = Arc::new(ScriptedSource::default().respond("one", &["a"]));
        let resolver = Resolver::new(&stores, source.clone(), Enricher::disabled(), FallbackCatalog::default());
        let key = ContentKey::new("movie", "tt1");

        let first = resolver.resolve(&key, None).await;
        assert_eq!(first.source, ResolutionSource::Addons);
        assert_eq!(first.streams[0].title, "a");

        let second = resolver.resolve(&key, None).await;
        assert_eq!(second.source, ResolutionSource::Cache);
        assert_eq!(source.calls(), 1);
        assert_eq!(stores.stats.summary().total_requests, 2);
        assert!(blocked.is_file());
    }
}
