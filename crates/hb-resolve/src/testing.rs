//! Test doubles for stream sources and metadata providers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use hb_core::{
    ContentKey, Error, MetaDetail, MetaSummary, ProviderDescriptor, Result, StreamDescriptor,
};

use crate::metadata::MetadataProvider;
use crate::source::StreamSource;

enum Script {
    Streams(Duration, Vec<StreamDescriptor>),
    Fail,
}

/// Answers by provider name and counts every call.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn respond(self, provider: &str, titles: &[&str]) -> Self {
        self.respond_after(provider, Duration::ZERO, titles)
    }

    pub fn respond_after(mut self, provider: &str, delay: Duration, titles: &[&str]) -> Self {
        let streams = titles
            .iter()
            .map(|t| StreamDescriptor::new(*t, format!("https://cdn.example/{t}.mp4")))
            .collect();
        self.scripts
            .insert(provider.into(), Script::Streams(delay, streams));
        self
    }

    pub fn fail(mut self, provider: &str) -> Self {
        self.scripts.insert(provider.into(), Script::Fail);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamSource for ScriptedSource {
    async fn fetch_streams(
        &self,
        provider: &ProviderDescriptor,
        _key: &ContentKey,
    ) -> Result<Vec<StreamDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(&provider.name) {
            Some(Script::Streams(delay, streams)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(streams.clone())
            }
            Some(Script::Fail) => Err(Error::unreachable(&provider.name, "scripted failure")),
            None => Err(Error::unreachable(&provider.name, "no script")),
        }
    }
}

/// Metadata provider answering every key with the same title.
pub struct StaticMetadata {
    title: String,
    pub lookups: AtomicUsize,
}

impl StaticMetadata {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.into(),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadata {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn summary(&self, _key: &ContentKey) -> Result<Option<MetaSummary>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(Some(MetaSummary {
            title: self.title.clone(),
            poster: None,
        }))
    }

    async fn detail(&self, key: &ContentKey) -> Result<Option<MetaDetail>> {
        let mut detail = MetaDetail::unknown(key);
        detail.name = self.title.clone();
        Ok(Some(detail))
    }
}
