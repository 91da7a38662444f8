//! Concurrent fan-out over every registered provider.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;

use hb_core::{ContentKey, ProviderDescriptor, StreamDescriptor};
use hb_store::{EventKind, EventLog};

use crate::source::StreamSource;

/// Queries all providers at once and merges what they return.
///
/// A failing or slow provider only loses its own contribution. Results are
/// concatenated in registration order, not completion order.
pub struct Aggregator {
    source: Arc<dyn StreamSource>,
    log: Arc<EventLog>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn StreamSource>, log: Arc<EventLog>) -> Self {
        Self { source, log }
    }

    pub async fn resolve(
        &self,
        key: &ContentKey,
        providers: &[ProviderDescriptor],
    ) -> Vec<StreamDescriptor> {
        let calls = providers.iter().map(|provider| async move {
            (provider, self.source.fetch_streams(provider, key).await)
        });
        let settled = join_all(calls).await;

        let mut merged = Vec::new();
        for (provider, outcome) in settled {
            match outcome {
                Ok(streams) => {
                    if !streams.is_empty() {
                        self.log
                            .append(
                                EventKind::AddonStreams,
                                &format!("{} returned {} stream(s)", provider.name, streams.len()),
                                json!({
                                    "addon": provider.name,
                                    "manifestUrl": provider.manifest_url,
                                    "count": streams.len(),
                                    "type": key.kind,
                                    "id": key.id,
                                }),
                            )
                            .await;
                    }
                    merged.extend(streams);
                }
                Err(e) => {
                    tracing::warn!(provider = %provider.name, key = %key, "Provider failed: {e}");
                    self.log
                        .append(
                            EventKind::AddonError,
                            &format!("{} failed", provider.name),
                            json!({
                                "addon": provider.name,
                                "manifestUrl": provider.manifest_url,
                                "error": e.to_string(),
                                "type": key.kind,
                                "id": key.id,
                            }),
                        )
                        .await;
                }
            }
        }
        merged
    }
}
