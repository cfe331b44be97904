mod settings;

pub use settings::{DatabaseConfig, ListenerConfig, ServerConfig, Settings, WebSocketConfig};
