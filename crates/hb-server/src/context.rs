//! Application context shared by every handler.

use std::sync::Arc;

use hb_core::config::Config;
use hb_resolve::{AddonClient, Enricher, FallbackCatalog, Resolver, StreamSource};
use hb_store::Stores;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Persisted documents.
    pub stores: Stores,
    /// Stream resolution, telemetry and enrichment.
    pub resolver: Arc<Resolver>,
}

impl AppContext {
    /// Wire the production stack: HTTP provider client, TMDB enrichment
    /// keyed from the settings document, and the built-in fallback catalog.
    pub fn new(config: Config, stores: Stores) -> Self {
        let source = Arc::new(AddonClient::new(config.resolver.provider_timeout()));
        let enricher = Enricher::new(stores.settings.clone(), config.metadata.clone());
        Self::with_parts(config, stores, source, enricher, FallbackCatalog::default())
    }

    pub fn with_parts(
        config: Config,
        stores: Stores,
        source: Arc<dyn StreamSource>,
        enricher: Enricher,
        fallback: FallbackCatalog,
    ) -> Self {
        let resolver = Arc::new(Resolver::new(&stores, source, enricher, fallback));
        Self {
            config: Arc::new(config),
            stores,
            resolver,
        }
    }
}
