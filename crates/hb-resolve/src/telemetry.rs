//! Request accounting with background metadata decoration.

use std::sync::Arc;

use tokio::task::JoinHandle;

use hb_core::{ContentKey, ResolutionSource};
use hb_store::{ErrorEvent, RequestSample, StatsStore};

use crate::enricher::Enricher;

/// Records resolutions and failed responses into the stats document.
///
/// Nothing here can fail the caller: persistence problems are logged by the
/// store, and metadata is attached by a detached task.
#[derive(Clone)]
pub struct Telemetry {
    stats: Arc<StatsStore>,
    enricher: Enricher,
}

impl Telemetry {
    pub fn new(stats: Arc<StatsStore>, enricher: Enricher) -> Self {
        Self { stats, enricher }
    }

    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.stats
    }

    /// Count one resolution of `key`. Returns the enrichment task, if one
    /// was started.
    pub async fn record(
        &self,
        key: &ContentKey,
        source: ResolutionSource,
        sample: RequestSample,
    ) -> Option<JoinHandle<()>> {
        let entry = self.stats.record(key, source, sample).await;
        if entry.needs_meta() {
            self.schedule_meta(key.clone())
        } else {
            None
        }
    }

    pub async fn record_error(&self, event: ErrorEvent) {
        tracing::debug!(status = event.status, path = %event.path, "Recording error response");
        self.stats.record_error(event).await;
    }

    /// Start enrichment for every recorded item still lacking metadata.
    pub fn schedule_missing_meta(&self) -> Vec<JoinHandle<()>> {
        self.stats
            .snapshot()
            .items
            .values()
            .filter(|item| item.needs_meta() && !item.content_id.is_empty())
            .filter_map(|item| self.schedule_meta(item.content_key()))
            .collect()
    }

    fn schedule_meta(&self, key: ContentKey) -> Option<JoinHandle<()>> {
        let stats = self.stats.clone();
        let cache_key = key.cache_key();
        self.enricher
            .spawn_attach(key, move |meta| async move {
                stats.attach_meta(&cache_key, meta).await
            })
    }
}
