//! Liveness and status endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::context::AppContext;

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /status
pub async fn status(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "providers": ctx.stores.providers.len(),
        "cacheEntries": ctx.stores.cache.len(),
    }))
}
