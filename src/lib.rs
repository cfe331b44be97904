// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Change-notification bridge
pub mod connection_manager;
pub mod listener;
pub mod notification;

// Inventory data (the notification producer)
pub mod inventory;

// Application layer
pub mod api;
pub mod server;
pub mod websocket;
