//! Inventory persistence. Writes fire the notify trigger; the store itself
//! never talks to the bridge.

use sqlx::PgPool;

use super::models::{CreateInventoryItem, InventoryItem};

#[derive(Clone)]
pub struct InventoryStore {
    pool: PgPool,
}

impl InventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All items, most recently updated first
    pub async fn list(&self) -> Result<Vec<InventoryItem>, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            "SELECT id, name, quantity, created_at, updated_at FROM inventory ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create(&self, item: &CreateInventoryItem) -> Result<InventoryItem, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            "INSERT INTO inventory (name, quantity) VALUES ($1, $2) \
             RETURNING id, name, quantity, created_at, updated_at",
        )
        .bind(item.name.trim())
        .bind(item.quantity)
        .fetch_one(&self.pool)
        .await
    }

    /// Returns `None` if no item has this id
    pub async fn update_quantity(
        &self,
        id: i32,
        quantity: i32,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            "UPDATE inventory SET quantity = $2 WHERE id = $1 \
             RETURNING id, name, quantity, created_at, updated_at",
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
    }

    /// Returns false if no item has this id
    pub async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `SELECT 1` round trip
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        if one == 1 {
            Ok(())
        } else {
            Err(sqlx::Error::Protocol(format!("unexpected SELECT 1 result: {}", one)))
        }
    }
}
