//! Stream resolution endpoint.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Value};

use hb_core::ContentKey;

use crate::context::AppContext;
use crate::middleware::telemetry::ClientAddr;
use crate::routes::strip_json_suffix;

/// GET /stream/{type}/{id}
///
/// Never fails: the worst case is an empty `streams` array. The resolution
/// runs detached, so a client hanging up does not cut the fan-out short.
pub async fn resolve_streams(
    State(ctx): State<AppContext>,
    Extension(ClientAddr(client)): Extension<ClientAddr>,
    Path((kind, id)): Path<(String, String)>,
) -> Json<Value> {
    let key = ContentKey::new(kind, strip_json_suffix(&id));
    let resolution = ctx.resolver.clone().resolve_detached(key, client).await;
    Json(json!({ "streams": resolution.streams }))
}
