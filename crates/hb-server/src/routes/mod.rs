//! Route handlers for the HTTP API.

pub mod addons;
pub mod cache;
pub mod config;
pub mod health;
pub mod logs;
pub mod meta;
pub mod recent;
pub mod stream;

use serde::Deserialize;

/// `?limit=` query shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// The requested limit, or `default` when absent or zero, capped at `max`.
    pub fn clamp(&self, default: usize, max: usize) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(default).min(max)
    }
}

/// Strip the `.json` suffix stream clients append to ids.
pub(crate) fn strip_json_suffix(id: &str) -> &str {
    id.strip_suffix(".json").unwrap_or(id)
}
