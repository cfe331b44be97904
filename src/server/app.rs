use axum::{http::Uri, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::api_routes;
use crate::error::AppError;
use crate::websocket::ws_handler;

use super::AppState;

/// Upper bound for JSON request bodies
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full router: REST endpoints plus the live-update socket.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(realtime_routes())
        .merge(api_routes())
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Push channel for connected clients
fn realtime_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
