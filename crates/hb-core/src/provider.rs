//! Upstream provider descriptors and endpoint construction.
//!
//! A provider is identified by its manifest URL. Stream lookups are made
//! against paths relative to the manifest's directory.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{Error, Result};
use crate::ids::{ContentKey, ProviderId};

const MANIFEST_FILE: &str = "manifest.json";
const SHORTHAND_SCHEME: &str = "stremio://";

/// What a provider was registered for. Informational only; every provider
/// is queried for streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum ProviderCategory {
    #[default]
    Streams,
    Catalog,
    Meta,
    Subtitles,
    Other,
}

impl ProviderCategory {
    /// Parse a category name, falling back to [`ProviderCategory::Streams`].
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("catalog") => Self::Catalog,
            Some("meta") => Self::Meta,
            Some("subtitles") => Self::Subtitles,
            Some("other") => Self::Other,
            _ => Self::Streams,
        }
    }
}

impl From<Option<String>> for ProviderCategory {
    fn from(value: Option<String>) -> Self {
        Self::parse(value.as_deref())
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streams => write!(f, "streams"),
            Self::Catalog => write!(f, "catalog"),
            Self::Meta => write!(f, "meta"),
            Self::Subtitles => write!(f, "subtitles"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A registered upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub name: String,
    #[serde(rename = "manifestUrl")]
    pub manifest_url: String,
    #[serde(default)]
    pub category: ProviderCategory,
}

impl ProviderDescriptor {
    /// Build a descriptor for an already-normalized manifest URL. The name
    /// defaults to the URL itself.
    pub fn new(manifest_url: String, name: Option<String>, category: ProviderCategory) -> Self {
        Self {
            id: ProviderId::from_manifest(&manifest_url),
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| manifest_url.clone()),
            manifest_url,
            category,
        }
    }

    /// Primary and suffix-less stream endpoints for `key`, in probe order.
    pub fn stream_endpoints(&self, key: &ContentKey) -> [String; 2] {
        let primary = format!(
            "{}stream/{}/{}.json",
            manifest_base(&self.manifest_url),
            key.kind,
            urlencoding::encode(&key.id)
        );
        let secondary = primary
            .strip_suffix(".json")
            .unwrap_or(&primary)
            .to_owned();
        [primary, secondary]
    }
}

impl ProviderId {
    /// `addon-` followed by the base64url (unpadded) manifest URL.
    pub fn from_manifest(manifest_url: &str) -> Self {
        Self::from(format!("addon-{}", URL_SAFE_NO_PAD.encode(manifest_url)))
    }
}

/// Canonicalize a user-supplied manifest locator.
///
/// `stremio://` shorthand becomes `https://`, only http(s) is accepted, and
/// a path that does not name the manifest gets `/manifest.json` appended.
pub fn normalize_manifest_url(raw: &str) -> Result<String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(Error::validation("Empty URL"));
    }

    let candidate = match input.strip_prefix(SHORTHAND_SCHEME) {
        Some(rest) => format!("https://{rest}"),
        None => input.to_owned(),
    };

    let mut url =
        Url::parse(&candidate).map_err(|e| Error::validation(format!("Invalid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(format!(
            "Unsupported protocol: {}",
            url.scheme()
        )));
    }

    let path = ensure_manifest_path(url.path());
    url.set_path(&path);
    Ok(url.to_string())
}

fn ensure_manifest_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return format!("/{MANIFEST_FILE}");
    }
    if path.contains(MANIFEST_FILE) {
        return path.to_owned();
    }
    format!("{}/{MANIFEST_FILE}", path.trim_end_matches('/'))
}

/// Directory of the manifest, always ending in `/`.
pub fn manifest_base(manifest_url: &str) -> String {
    match manifest_url.find(MANIFEST_FILE) {
        Some(idx) => manifest_url[..idx].to_owned(),
        None if manifest_url.ends_with('/') => manifest_url.to_owned(),
        None => format!("{manifest_url}/"),
    }
}
