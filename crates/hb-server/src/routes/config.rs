//! Provider credential management.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use hb_store::{CredentialsUpdate, EventKind};

use crate::context::AppContext;

/// GET /api/config
pub async fn get_config(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({ "config": ctx.stores.settings.credentials() }))
}

/// POST /api/config
///
/// Replaces all five credential fields; omitted ones are cleared.
pub async fn update_config(
    State(ctx): State<AppContext>,
    Json(update): Json<CredentialsUpdate>,
) -> Json<Value> {
    let presence = update.presence();
    let config = ctx.stores.settings.update(update).await;
    ctx.stores
        .logs
        .append(EventKind::ConfigUpdate, "Config saved", presence)
        .await;
    tracing::info!("Provider credentials updated");
    Json(json!({ "config": config }))
}
