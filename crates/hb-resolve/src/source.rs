//! Fetching streams from a single upstream provider.

use std::time::Duration;

use async_trait::async_trait;

use hb_core::stream::parse_stream_document;
use hb_core::{ContentKey, Error, ProviderDescriptor, Result, StreamDescriptor};

/// Something that can answer a stream query for one provider.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Streams `provider` offers for `key`, in the provider's own order.
    async fn fetch_streams(
        &self,
        provider: &ProviderDescriptor,
        key: &ContentKey,
    ) -> Result<Vec<StreamDescriptor>>;
}

/// HTTP client for Stremio-style addon endpoints.
///
/// Probes `…/stream/{type}/{id}.json` first and the suffix-less variant
/// second. Each attempt is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct AddonClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl AddonClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    async fn fetch_document(&self, provider: &str, url: &str) -> Result<Vec<StreamDescriptor>> {
        let resp = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::unreachable(provider, describe(&e)))?;

        if !resp.status().is_success() {
            return Err(Error::unreachable(provider, format!("HTTP {}", resp.status())));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::unreachable(provider, describe(&e)))?;
        parse_stream_document(provider, &body)
    }
}

#[async_trait]
impl StreamSource for AddonClient {
    async fn fetch_streams(
        &self,
        provider: &ProviderDescriptor,
        key: &ContentKey,
    ) -> Result<Vec<StreamDescriptor>> {
        let mut last_error = None;
        for url in provider.stream_endpoints(key) {
            match self.fetch_document(&provider.name, &url).await {
                Ok(streams) => return Ok(streams),
                Err(e) => {
                    tracing::debug!(provider = %provider.name, %url, "Stream endpoint failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::unreachable(&provider.name, "no endpoints")))
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timed out".into()
    } else {
        e.to_string()
    }
}
