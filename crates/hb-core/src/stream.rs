//! Stream descriptors and validation of provider payloads.
//!
//! Provider responses are untrusted JSON. [`parse_stream_document`] turns a
//! response body into typed [`StreamDescriptor`]s, rejecting payloads that are
//! not stream documents and dropping entries that carry no playable locator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// Fields that can point at something playable, in preference order.
const LOCATOR_FIELDS: [&str; 4] = ["url", "infoHash", "ytId", "externalUrl"];

/// A playable source entry: a human-readable title plus a locator.
///
/// Fields the resolver does not interpret are kept in `extra` and serialized
/// back verbatim, so clients see the provider's hints untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "infoHash", default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(rename = "ytId", default, skip_serializing_if = "Option::is_none")]
    pub yt_id: Option<String>,
    #[serde(rename = "externalUrl", default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamDescriptor {
    /// A plain URL stream.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            info_hash: None,
            yt_id: None,
            external_url: None,
            extra: Map::new(),
        }
    }

    /// The first locator present, in `url`, `infoHash`, `ytId`,
    /// `externalUrl` order.
    pub fn locator(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.info_hash.as_deref())
            .or(self.yt_id.as_deref())
            .or(self.external_url.as_deref())
    }

    /// Validate one untrusted stream entry.
    ///
    /// Returns `None` when the entry is not an object or has no locator. The
    /// title falls back to `name`, then `description`, then the locator.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };

        let locators = LOCATOR_FIELDS.map(|key| take_string(&mut fields, key));
        if locators.iter().all(Option::is_none) {
            return None;
        }

        let title = take_string(&mut fields, "title")
            .or_else(|| non_empty_str(fields.get("name")))
            .or_else(|| non_empty_str(fields.get("description")))
            .or_else(|| locators.iter().flatten().next().cloned())?;

        let [url, info_hash, yt_id, external_url] = locators;
        Some(Self {
            title,
            url,
            info_hash,
            yt_id,
            external_url,
            extra: fields,
        })
    }
}

/// Which tier of the fallback chain produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Cache,
    Addons,
    Demo,
    Empty,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Addons => write!(f, "addons"),
            Self::Demo => write!(f, "demo"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Parse a provider response body into its stream list.
///
/// The body must be a JSON object whose `streams` member is an array;
/// anything else is [`Error::ProviderMalformed`]. Entries without a locator
/// are skipped.
pub fn parse_stream_document(provider: &str, body: &[u8]) -> Result<Vec<StreamDescriptor>> {
    let document: Value =
        serde_json::from_slice(body).map_err(|e| Error::malformed(provider, e))?;

    let Some(entries) = document.get("streams").and_then(Value::as_array) else {
        return Err(Error::malformed(provider, "missing streams array"));
    };

    let total = entries.len();
    let streams: Vec<StreamDescriptor> = entries
        .iter()
        .cloned()
        .filter_map(StreamDescriptor::from_value)
        .collect();

    if streams.len() < total {
        tracing::debug!(
            provider,
            dropped = total - streams.len(),
            "Skipped stream entries without a locator"
        );
    }

    Ok(streams)
}

/// Remove `key` from the entry, keeping it only if it is a non-empty string.
/// Typed fields never fall through into `extra`.
fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
