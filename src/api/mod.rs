//! API layer - HTTP endpoint handlers organized by domain.

mod extract;
mod health;
mod inventory;
mod metrics;
mod routes;

pub use extract::ApiJson;
pub use health::{db_check, health, stats};
pub use inventory::{create_item, delete_item, list_items, update_item};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
