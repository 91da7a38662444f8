//! Registry of upstream stream providers.
//!
//! Providers are kept in registration order, which is also the order their
//! streams appear in aggregated results. Locators are normalized on add and
//! deduplicated by their normalized form.

use parking_lot::RwLock;
use std::path::PathBuf;

use hb_core::provider::normalize_manifest_url;
use hb_core::{Error, ProviderCategory, ProviderDescriptor, Result};

use crate::document::Document;

/// Outcome of [`ProviderRegistry::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new provider was appended.
    Added(ProviderDescriptor),
    /// The locator was already registered; name/category were updated in
    /// place.
    Existing(ProviderDescriptor),
}

impl Registration {
    pub fn provider(&self) -> &ProviderDescriptor {
        match self {
            Self::Added(p) | Self::Existing(p) => p,
        }
    }

    pub fn into_provider(self) -> ProviderDescriptor {
        match self {
            Self::Added(p) | Self::Existing(p) => p,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Persisted, ordered provider list.
#[derive(Debug)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<ProviderDescriptor>>,
    document: Document,
}

impl ProviderRegistry {
    pub fn open(path: Option<PathBuf>) -> Self {
        let document = Document::new(path);
        let providers: Vec<ProviderDescriptor> = document.load();
        if !providers.is_empty() {
            tracing::info!("Loaded {} registered addons", providers.len());
        }

        Self {
            providers: RwLock::new(providers),
            document,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(None)
    }

    /// Immutable snapshot in registration order.
    pub fn list(&self) -> Vec<ProviderDescriptor> {
        self.providers.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<ProviderDescriptor> {
        self.providers
            .read()
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
    }

    /// Register a provider by manifest locator.
    ///
    /// Re-adding a known locator renames it when `name` is given and
    /// differs, and re-categorizes it when `category` is given.
    pub async fn add(
        &self,
        locator: &str,
        name: Option<String>,
        category: Option<&str>,
    ) -> Result<Registration> {
        let manifest_url = normalize_manifest_url(locator)?;
        let name = name.filter(|n| !n.trim().is_empty());

        let writer = self.document.lock().await;
        let (registration, snapshot) = {
            let mut providers = self.providers.write();
            let registration = match providers.iter_mut().find(|p| p.manifest_url == manifest_url) {
                Some(existing) => {
                    if let Some(name) = name {
                        if name != existing.name {
                            existing.name = name;
                        }
                    }
                    if category.is_some() {
                        existing.category = ProviderCategory::parse(category);
                    }
                    Registration::Existing(existing.clone())
                }
                None => {
                    let provider = ProviderDescriptor::new(
                        manifest_url,
                        name,
                        ProviderCategory::parse(category),
                    );
                    providers.push(provider.clone());
                    Registration::Added(provider)
                }
            };
            (registration, serde_json::to_string_pretty(&*providers))
        };
        writer.persist(snapshot).await;
        Ok(registration)
    }

    pub async fn remove(&self, id: &str) -> Result<ProviderDescriptor> {
        let writer = self.document.lock().await;
        let (removed, snapshot) = {
            let mut providers = self.providers.write();
            let idx = providers
                .iter()
                .position(|p| p.id.as_str() == id)
                .ok_or_else(|| Error::not_found("addon", id))?;
            let removed = providers.remove(idx);
            (removed, serde_json::to_string_pretty(&*providers))
        };
        writer.persist(snapshot).await;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_normalizes_locator() {
        let registry = ProviderRegistry::in_memory();
        let reg = registry
            .add("stremio://addon.example/", Some("Example".into()), None)
            .await
            .unwrap();

        assert!(reg.is_new());
        let provider = reg.provider();
        assert_eq!(provider.manifest_url, "https://addon.example/manifest.json");
        assert_eq!(provider.name, "Example");
        assert_eq!(provider.category, ProviderCategory::Streams);
        assert!(provider.id.as_str().starts_with("addon-"));
    }

    #[tokio::test]
    async fn re_add_updates_in_place() {
        let registry = ProviderRegistry::in_memory();
        registry
            .add("https://a.example/manifest.json", Some("A".into()), Some("streams"))
            .await
            .unwrap();
        registry.add("https://b.example", None, None).await.unwrap();

        let reg = registry
            .add("https://a.example/", Some("A renamed".into()), Some("meta"))
            .await
            .unwrap();
        assert!(!reg.is_new());

        let list = registry.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "A renamed");
        assert_eq!(list[0].category, ProviderCategory::Meta);
        assert_eq!(list[1].name, "https://b.example/manifest.json");
    }

    #[tokio::test]
    async fn re_add_without_name_keeps_name() {
        let registry = ProviderRegistry::in_memory();
        registry
            .add("https://a.example", Some("Keep".into()), Some("catalog"))
            .await
            .unwrap();
        let reg = registry.add("https://a.example", None, None).await.unwrap();
        assert_eq!(reg.provider().name, "Keep");
        assert_eq!(reg.provider().category, ProviderCategory::Catalog);
    }

    #[tokio::test]
    async fn invalid_locator_is_rejected() {
        let registry = ProviderRegistry::in_memory();
        let err = registry.add("mailto:someone", None, None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn remove_by_id() {
        let registry = ProviderRegistry::in_memory();
        let id = registry
            .add("https://a.example", None, None)
            .await
            .unwrap()
            .into_provider()
            .id;

        let removed = registry.remove(id.as_str()).await.unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.is_empty());

        let err = registry.remove(id.as_str()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn persists_registration_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addons.json");
        let registry = ProviderRegistry::open(Some(path.clone()));
        for host in ["https://one.example", "https://two.example", "https://three.example"] {
            registry.add(host, None, None).await.unwrap();
        }

        let reloaded = ProviderRegistry::open(Some(path));
        assert_eq!(reloaded.list(), registry.list());
        assert_eq!(
            reloaded.list()[2].manifest_url,
            "https://three.example/manifest.json"
        );
    }
}
