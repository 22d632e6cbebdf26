use std::net::SocketAddr;

use axum::{
    Json, Router, extract::ConnectInfo, http::StatusCode, response::IntoResponse, routing::get,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

pub fn app(cargo_pkg_name: &'static str, cargo_pkg_version: &'static str) -> Router {
    Router::new()
        .route(
            "/",
            get(move |connect_info| root_handler(cargo_pkg_name, cargo_pkg_version, connect_info)),
        )
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

#[instrument(name = "root_handler", skip_all)]
async fn root_handler(
    cargo_pkg_name: &'static str,
    cargo_pkg_version: &'static str,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    debug!(%addr, "client connected");
    Json(json!({
        "service": cargo_pkg_name,
        "version": cargo_pkg_version,
        "status": "ok"
    }))
}

#[instrument(name = "health_handler", skip_all)]
async fn health_handler(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> impl IntoResponse {
    debug!(%addr, "client connected");
    Json(json!({ "status": "healthy" }))
}

#[instrument(name = "ready_handler", skip_all)]
async fn ready_handler(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> impl IntoResponse {
    debug!(%addr, "client connected");
    Json(json!({ "status": "ready" }))
}

#[instrument(name = "not_found_handler", skip_all, fields(addr = %addr))]
async fn not_found_handler(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}
