//! Health check, database check and bridge statistics endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::listener::ConnectionState;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct DbCheckResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub subscribers: usize,
    pub listener: ListenerStats,
}

#[derive(Debug, Serialize)]
pub struct ListenerStats {
    pub channel: String,
    pub state: ConnectionState,
    pub handlers: usize,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /db-check - one `SELECT 1` round trip
pub async fn db_check(State(state): State<AppState>) -> (StatusCode, Json<DbCheckResponse>) {
    match state.inventory.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(DbCheckResponse {
                status: "ok".to_string(),
                message: "Database connection succeeded".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Database check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(DbCheckResponse {
                    status: "error".to_string(),
                    message: format!("Database connection failed: {}", e),
                }),
            )
        }
    }
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        subscribers: state.connection_manager.stats().total_connections,
        listener: ListenerStats {
            channel: state.listener.channel().to_string(),
            state: state.listener.state(),
            handlers: state.listener.handler_count(),
        },
    })
}
