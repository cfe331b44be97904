//! Inventory CRUD endpoints.
//!
//! Responses never wait on the bridge: the database trigger publishes each
//! change and the listener picks it up independently.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::inventory::{CreateInventoryItem, InventoryItem, UpdateInventoryItem};
use crate::server::AppState;

use super::ApiJson;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// GET /api/inventory
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>> {
    let items = state.inventory.list().await?;
    Ok(Json(items))
}

/// POST /api/inventory
#[tracing::instrument(name = "inventory.create", skip(state, body), fields(name = %body.name))]
pub async fn create_item(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateInventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>)> {
    body.validate()?;
    let item = state.inventory.create(&body).await?;

    tracing::info!(item_id = item.id, quantity = item.quantity, "Inventory item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/inventory/{id}
#[tracing::instrument(name = "inventory.update", skip(state, body))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(body): ApiJson<UpdateInventoryItem>,
) -> Result<Json<InventoryItem>> {
    let item = state
        .inventory
        .update_quantity(id, body.quantity)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

    tracing::info!(item_id = item.id, quantity = item.quantity, "Inventory item updated");
    Ok(Json(item))
}

/// DELETE /api/inventory/{id}
#[tracing::instrument(name = "inventory.delete", skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>> {
    if !state.inventory.delete(id).await? {
        return Err(AppError::NotFound("Item not found".to_string()));
    }

    tracing::info!(item_id = id, "Inventory item deleted");
    Ok(Json(DeleteResponse {
        message: "Item deleted successfully".to_string(),
    }))
}
