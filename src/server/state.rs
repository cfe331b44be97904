use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Settings;
use crate::connection_manager::ConnectionManager;
use crate::inventory::InventoryStore;
use crate::listener::{ChannelConnector, ChannelListener};
use crate::notification::BroadcastHandler;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub connection_manager: Arc<ConnectionManager>,
    pub listener: Arc<ChannelListener>,
    pub inventory: InventoryStore,
}

impl AppState {
    /// Wire the bridge: the listener broadcasts every notification through
    /// the connection manager. The listener is not started here.
    pub fn new(settings: Settings, pool: PgPool, connector: Arc<dyn ChannelConnector>) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());

        let listener = Arc::new(ChannelListener::from_config(connector, &settings.listener));
        listener.register(Arc::new(BroadcastHandler::new(connection_manager.clone())));

        Self {
            settings: Arc::new(settings),
            connection_manager,
            listener,
            inventory: InventoryStore::new(pool),
        }
    }
}
