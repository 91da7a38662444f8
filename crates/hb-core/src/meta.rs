//! Display metadata attached to cache entries and request statistics.

use serde::{Deserialize, Serialize};

use crate::ids::ContentKey;

/// Title and poster used to decorate admin listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
}

impl MetaSummary {
    /// A summary without a title is treated as missing.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Full descriptor served to meta-resolution callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDetail {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,
}

impl MetaDetail {
    /// Placeholder returned when no metadata source answers.
    pub fn unknown(key: &ContentKey) -> Self {
        Self {
            id: key.id.clone(),
            kind: key.kind.clone(),
            name: "Unknown".into(),
            poster: None,
            background: None,
            description: None,
            release_info: None,
            runtime: None,
            imdb_rating: None,
        }
    }
}
