//! Inventory items: the CRUD data whose changes the bridge publishes.

mod models;
mod store;

pub use models::{CreateInventoryItem, InventoryItem, UpdateInventoryItem};
pub use store::InventoryStore;
