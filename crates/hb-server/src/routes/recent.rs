//! Request statistics.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use hb_store::stats::{DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT, REPORTED_ERRORS};

use crate::context::AppContext;
use crate::routes::LimitQuery;

/// GET /api/recent
pub async fn recent(State(ctx): State<AppContext>, Query(query): Query<LimitQuery>) -> Json<Value> {
    let telemetry = ctx.resolver.telemetry();
    telemetry.schedule_missing_meta();

    let stats = telemetry.stats();
    Json(json!({
        "recent": stats.recent(query.clamp(DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT)),
        "summary": stats.summary(),
        "errors": stats.errors(REPORTED_ERRORS),
    }))
}

/// DELETE /api/recent
pub async fn clear_recent(State(ctx): State<AppContext>) -> StatusCode {
    ctx.resolver.telemetry().stats().clear().await;
    StatusCode::NO_CONTENT
}
