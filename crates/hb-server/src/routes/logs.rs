//! Event log access.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use hb_store::logs::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

use crate::context::AppContext;
use crate::routes::LimitQuery;

/// GET /api/logs
pub async fn list_logs(
    State(ctx): State<AppContext>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let logs = ctx
        .stores
        .logs
        .recent(query.clamp(DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT));
    Json(json!({ "logs": logs }))
}

/// DELETE /api/logs
pub async fn clear_logs(State(ctx): State<AppContext>) -> StatusCode {
    ctx.stores.logs.clear().await;
    StatusCode::NO_CONTENT
}
