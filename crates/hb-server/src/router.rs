//! Axum router construction.
//!
//! Stream and meta routes sit at the root where stream clients expect them;
//! administration lives under `/api`.

use axum::middleware;
use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::middleware::telemetry::telemetry_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Providers
        .route(
            "/addons",
            get(routes::addons::list_addons).post(routes::addons::add_addon),
        )
        .route("/addons/{id}", delete(routes::addons::delete_addon))
        // Cache
        .route("/cache", get(routes::cache::list_cache))
        .route(
            "/cache/{id}",
            get(routes::cache::get_cache_entry).delete(routes::cache::delete_cache_entry),
        )
        .route(
            "/cache/{id}/streams/{idx}",
            delete(routes::cache::delete_cache_stream),
        )
        // Stats and logs
        .route(
            "/recent",
            get(routes::recent::recent).delete(routes::recent::clear_recent),
        )
        .route(
            "/logs",
            get(routes::logs::list_logs).delete(routes::logs::clear_logs),
        )
        // Credentials
        .route(
            "/config",
            get(routes::config::get_config).post(routes::config::update_config),
        );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/status", get(routes::health::status))
        .route("/stream/{type}/{id}", get(routes::stream::resolve_streams))
        .route("/meta/{type}/{id}", get(routes::meta::get_meta))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(ctx.clone(), telemetry_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
