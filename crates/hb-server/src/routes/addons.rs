//! Provider registry administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use hb_store::{EventKind, Registration};

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AddAddonRequest {
    #[serde(default)]
    pub url: String,
    pub name: Option<String>,
    pub category: Option<String>,
}

/// GET /api/addons
pub async fn list_addons(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({ "addons": ctx.stores.providers.list() }))
}

/// POST /api/addons
pub async fn add_addon(
    State(ctx): State<AppContext>,
    Json(req): Json<AddAddonRequest>,
) -> Result<Response, AppError> {
    let log = &ctx.stores.logs;
    let registration = match ctx
        .stores
        .providers
        .add(&req.url, req.name, req.category.as_deref())
        .await
    {
        Ok(registration) => registration,
        Err(e) => {
            log.append(
                EventKind::AddonError,
                "Failed to add addon",
                json!({ "error": e.to_string() }),
            )
            .await;
            return Err(e.into());
        }
    };

    let addon = registration.provider();
    let meta = json!({
        "manifestUrl": addon.manifest_url,
        "name": addon.name,
        "category": addon.category,
    });
    let response = match &registration {
        Registration::Added(addon) => {
            tracing::info!(addon = %addon.name, "Provider registered");
            log.append(EventKind::AddonAdd, "Addon added", meta).await;
            (StatusCode::CREATED, Json(json!({ "addon": addon }))).into_response()
        }
        Registration::Existing(addon) => {
            log.append(EventKind::AddonExists, "Addon already present", meta)
                .await;
            (
                StatusCode::OK,
                Json(json!({ "addon": addon, "note": "already exists" })),
            )
                .into_response()
        }
    };
    Ok(response)
}

/// DELETE /api/addons/{id}
pub async fn delete_addon(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = ctx.stores.providers.remove(&id).await?;
    tracing::info!(addon = %removed.name, "Provider removed");
    ctx.stores
        .logs
        .append(
            EventKind::AddonRemove,
            "Addon removed",
            json!({ "id": removed.id, "manifestUrl": removed.manifest_url }),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}
