//! Client address capture and error accounting.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use hb_store::ErrorEvent;

use crate::context::AppContext;

/// Peer address of the current request, when the server was started with
/// connect info.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

/// Records every response with status >= 400 into the stats document.
pub async fn telemetry_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    request.extensions_mut().insert(ClientAddr(client));

    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        ctx.resolver
            .telemetry()
            .record_error(ErrorEvent {
                ts: Utc::now(),
                ip: client.map(|ip| ip.to_string()),
                method,
                path,
                status: status.as_u16(),
            })
            .await;
    }

    response
}
