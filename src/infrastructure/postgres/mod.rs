//! PostgreSQL persistence module.
//!
//! Provides connection pooling and schema bootstrap for the inventory store.

pub mod bootstrap;
pub mod pool;

pub use bootstrap::{bootstrap_schema, schema_sql};
pub use pool::{create_lazy_pool, create_pool, mask_database_url};
