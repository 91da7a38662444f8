//! Stream cache inspection and pruning.
//!
//! Entries are addressed by external id, never by the raw content id.
//! Listing or inspecting entries that lack metadata schedules enrichment in
//! the background; the response reflects what is stored right now.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use hb_core::Error;
use hb_store::EventKind;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /api/cache
pub async fn list_cache(State(ctx): State<AppContext>) -> Json<Value> {
    let scheduled = ctx.resolver.schedule_missing_cache_meta();
    if !scheduled.is_empty() {
        tracing::debug!("Scheduled metadata for {} cache entries", scheduled.len());
    }

    let cache: Vec<Value> = ctx
        .stores
        .cache
        .list()
        .into_iter()
        .map(|(key, entry)| {
            json!({
                "key": key,
                "id": entry.external_id,
                "type": entry.kind,
                "metaId": entry.content_id,
                "streamsCount": entry.streams.len(),
                "updatedAt": entry.updated_at,
                "meta": entry.meta,
            })
        })
        .collect();
    Json(json!({ "cache": cache }))
}

/// GET /api/cache/{id}
pub async fn get_cache_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (_, entry) = ctx
        .stores
        .cache
        .find(&id)
        .ok_or_else(|| Error::not_found("cache entry", &id))?;

    if entry.needs_meta() {
        ctx.resolver.schedule_cache_meta(&entry.content_key());
    }

    Ok(Json(json!({
        "id": entry.external_id,
        "type": entry.kind,
        "metaId": entry.content_id,
        "meta": entry.meta,
        "updatedAt": entry.updated_at,
        "streams": entry.streams,
    })))
}

/// DELETE /api/cache/{id}
pub async fn delete_cache_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let (key, _) = ctx
        .stores
        .cache
        .find(&id)
        .ok_or_else(|| Error::not_found("cache entry", &id))?;
    ctx.stores.cache.delete(&key).await?;
    ctx.stores
        .logs
        .append(EventKind::CacheRemove, "Removed cache entry", json!({ "id": id }))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cache/{id}/streams/{idx}
pub async fn delete_cache_stream(
    State(ctx): State<AppContext>,
    Path((id, idx)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let index: usize = idx
        .parse()
        .map_err(|_| Error::validation(format!("invalid index '{idx}'")))?;
    let (key, _) = ctx
        .stores
        .cache
        .find(&id)
        .ok_or_else(|| Error::not_found("cache entry", &id))?;

    let remaining = ctx.stores.cache.delete_stream(&key, index).await?;
    ctx.stores
        .logs
        .append(
            EventKind::CacheStreamRemove,
            "Removed cached stream",
            json!({ "id": id, "index": index, "remaining": remaining.streams.len() }),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}
