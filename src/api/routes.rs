use axum::{
    routing::{get, put},
    Router,
};

use crate::server::AppState;

use super::health::{db_check, health, stats};
use super::inventory::{create_item, delete_item, list_items, update_item};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/db-check", get(db_check))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Inventory CRUD
        .nest(
            "/api",
            Router::new()
                .route("/inventory", get(list_items).post(create_item))
                .route("/inventory/{id}", put(update_item).delete(delete_item)),
        )
}
