use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A stored inventory row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryItem {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/inventory`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInventoryItem {
    pub name: String,
    pub quantity: i32,
}

/// Body of `PUT /api/inventory/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInventoryItem {
    pub quantity: i32,
}

impl CreateInventoryItem {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let item = CreateInventoryItem {
            name: "   ".into(),
            quantity: 3,
        };
        assert!(matches!(item.validate(), Err(AppError::Validation(_))));

        let item = CreateInventoryItem {
            name: "widget".into(),
            quantity: 3,
        };
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_item_serializes_timestamps() {
        let item = InventoryItem {
            id: 1,
            name: "widget".into(),
            quantity: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "widget");
        assert!(json["updated_at"].is_string());
    }
}
