use std::sync::Arc;

use async_trait::async_trait;

use crate::connection_manager::ConnectionManager;

use super::{Notification, NotificationHandler};

/// Handler that forwards every notification to all connected subscribers.
pub struct BroadcastHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl BroadcastHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }
}

#[async_trait]
impl NotificationHandler for BroadcastHandler {
    async fn handle(&self, notification: Arc<Notification>) -> anyhow::Result<()> {
        let result = self.connection_manager.broadcast(&notification).await;

        tracing::debug!(
            delivered = result.delivered,
            failed = result.failed,
            "Broadcast notification to subscribers"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "broadcast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_manager::ConnectionHandle;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_forwards_to_connected_handles() {
        let manager = Arc::new(ConnectionManager::new());
        let (tx, mut rx) = mpsc::channel(4);
        manager.connect(Arc::new(ConnectionHandle::new(tx, Duration::from_secs(1))));

        let handler = BroadcastHandler::new(manager.clone());
        let mut n = Notification::new();
        n.insert("event".into(), json!("INSERT"));
        handler.handle(Arc::new(n)).await.unwrap();

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload.as_ref(), r#"{"event":"INSERT"}"#);
    }
}
