//! Meta descriptor endpoint.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use hb_core::{ContentKey, MetaDetail};

use crate::context::AppContext;
use crate::routes::strip_json_suffix;

/// GET /meta/{type}/{id}
pub async fn get_meta(
    State(ctx): State<AppContext>,
    Path((kind, id)): Path<(String, String)>,
) -> Json<Value> {
    let key = ContentKey::new(kind, strip_json_suffix(&id));
    let meta = ctx
        .resolver
        .enricher()
        .detail(&key)
        .await
        .unwrap_or_else(|| MetaDetail::unknown(&key));
    Json(json!({ "meta": meta }))
}
