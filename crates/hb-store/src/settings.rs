//! Provider credentials editable at runtime.
//!
//! Unknown keys found in the document are carried through untouched.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::document::Document;

/// Credentials for external services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderCredentials {
    pub tmdb_api_key: String,
    pub trakt_client_id: String,
    pub trakt_client_secret: String,
    pub trakt_access_token: String,
    pub opensubtitles_api_key: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A full replacement of the credential fields; absent fields clear the
/// stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialsUpdate {
    pub tmdb_api_key: Option<String>,
    pub trakt_client_id: Option<String>,
    pub trakt_client_secret: Option<String>,
    pub trakt_access_token: Option<String>,
    pub opensubtitles_api_key: Option<String>,
}

impl CredentialsUpdate {
    /// Which credentials are present, without revealing them.
    pub fn presence(&self) -> Value {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        serde_json::json!({
            "hasTmdbKey": set(&self.tmdb_api_key),
            "hasTraktClient": set(&self.trakt_client_id) && set(&self.trakt_client_secret),
            "hasTraktToken": set(&self.trakt_access_token),
            "hasOsApiKey": set(&self.opensubtitles_api_key),
        })
    }
}

/// Persisted credentials document.
#[derive(Debug)]
pub struct SettingsStore {
    credentials: RwLock<ProviderCredentials>,
    document: Document,
}

impl SettingsStore {
    pub fn open(path: Option<PathBuf>) -> Self {
        let document = Document::new(path);
        let credentials = document.load();
        Self {
            credentials: RwLock::new(credentials),
            document,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(None)
    }

    pub fn credentials(&self) -> ProviderCredentials {
        self.credentials.read().clone()
    }

    /// The TMDB key, if one is configured.
    pub fn tmdb_api_key(&self) -> Option<String> {
        let key = self.credentials.read().tmdb_api_key.trim().to_owned();
        (!key.is_empty()).then_some(key)
    }

    pub async fn update(&self, update: CredentialsUpdate) -> ProviderCredentials {
        let writer = self.document.lock().await;
        let (credentials, snapshot) = {
            let mut credentials = self.credentials.write();
            credentials.tmdb_api_key = update.tmdb_api_key.unwrap_or_default();
            credentials.trakt_client_id = update.trakt_client_id.unwrap_or_default();
            credentials.trakt_client_secret = update.trakt_client_secret.unwrap_or_default();
            credentials.trakt_access_token = update.trakt_access_token.unwrap_or_default();
            credentials.opensubtitles_api_key = update.opensubtitles_api_key.unwrap_or_default();
            (credentials.clone(), serde_json::to_string_pretty(&*credentials))
        };
        writer.persist(snapshot).await;
        credentials
    }
}
