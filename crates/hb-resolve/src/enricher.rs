//! Best-effort metadata enrichment.
//!
//! The TMDB key lives in the runtime settings document and can change at
//! any time, so a provider is built per lookup. Every failure degrades to
//! "no metadata"; nothing here returns an error.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use hb_core::config::MetadataConfig;
use hb_core::{ContentKey, MetaDetail, MetaSummary};
use hb_store::SettingsStore;

use crate::metadata::{create_limiter, MetadataProvider, SharedLimiter, TmdbProvider};

#[derive(Clone)]
enum Backend {
    /// TMDB, keyed from the settings store at lookup time.
    Tmdb {
        settings: Arc<SettingsStore>,
        config: MetadataConfig,
        http: reqwest::Client,
        limiter: SharedLimiter,
    },
    Fixed(Arc<dyn MetadataProvider>),
    Disabled,
}

/// Attaches display metadata when a capability is configured.
#[derive(Clone)]
pub struct Enricher {
    backend: Backend,
}

impl Enricher {
    pub fn new(settings: Arc<SettingsStore>, config: MetadataConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client for metadata: {e}");
                reqwest::Client::new()
            });
        let limiter = create_limiter(config.requests_per_second);
        Self {
            backend: Backend::Tmdb {
                settings,
                config,
                http,
                limiter,
            },
        }
    }

    /// Always use `provider`, regardless of stored credentials.
    pub fn with_provider(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            backend: Backend::Fixed(provider),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
        }
    }

    fn provider(&self) -> Option<Arc<dyn MetadataProvider>> {
        match &self.backend {
            Backend::Tmdb {
                settings,
                config,
                http,
                limiter,
            } => {
                let api_key = settings.tmdb_api_key()?;
                Some(Arc::new(TmdbProvider::new(
                    http.clone(),
                    api_key,
                    config.clone(),
                    limiter.clone(),
                )))
            }
            Backend::Fixed(provider) => Some(provider.clone()),
            Backend::Disabled => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider().is_some()
    }

    /// Title and poster for `key`, or `None` when unavailable for any reason.
    pub async fn best_effort(&self, key: &ContentKey) -> Option<MetaSummary> {
        let provider = self.provider()?;
        match provider.summary(key).await {
            Ok(Some(meta)) if meta.is_complete() => Some(meta),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(provider = provider.name(), key = %key, "Metadata lookup failed: {e}");
                None
            }
        }
    }

    /// Full descriptor for `key`, or `None` when unavailable.
    pub async fn detail(&self, key: &ContentKey) -> Option<MetaDetail> {
        let provider = self.provider()?;
        match provider.detail(key).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::debug!(provider = provider.name(), key = %key, "Metadata detail failed: {e}");
                None
            }
        }
    }

    /// Look `key` up in the background and hand the result to `apply`.
    ///
    /// Returns `None` without spawning when no capability is configured.
    pub fn spawn_attach<F, Fut>(&self, key: ContentKey, apply: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(MetaSummary) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if !self.is_configured() {
            return None;
        }
        let enricher = self.clone();
        Some(tokio::spawn(async move {
            if let Some(meta) = enricher.best_effort(&key).await {
                if apply(meta).await {
                    tracing::debug!(key = %key, "Attached metadata");
                }
            }
        }))
    }
}
