use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::BroadcastMetrics;
use crate::notification::Notification;

use super::types::{ConnectionStats, Subscriber};

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastResult {
    /// Subscribers the message was handed to
    pub delivered: usize,
    /// Subscribers whose send failed (and were removed)
    pub failed: usize,
}

/// Tracks the live subscriber set and fans messages out to it.
pub struct ConnectionManager {
    /// subscriber_id -> subscriber
    subscribers: DashMap<Uuid, Arc<dyn Subscriber>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Register a new subscriber
    pub fn connect(&self, subscriber: Arc<dyn Subscriber>) -> Uuid {
        let id = subscriber.id();
        self.subscribers.insert(id, subscriber);

        tracing::info!(subscriber_id = %id, total = self.subscribers.len(), "Subscriber connected");
        id
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn disconnect(&self, subscriber_id: Uuid) -> bool {
        let removed = self.subscribers.remove(&subscriber_id).is_some();
        if removed {
            tracing::info!(subscriber_id = %subscriber_id, total = self.subscribers.len(), "Subscriber disconnected");
        }
        removed
    }

    pub fn contains(&self, subscriber_id: Uuid) -> bool {
        self.subscribers.contains_key(&subscriber_id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            total_connections: self.subscribers.len(),
        }
    }

    /// Serialize a notification once and deliver it to every subscriber.
    pub async fn broadcast(&self, notification: &Notification) -> BroadcastResult {
        let payload = match serde_json::to_string(notification) {
            Ok(json) => Arc::<str>::from(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notification for broadcast");
                return BroadcastResult::default();
            }
        };

        self.broadcast_raw(payload).await
    }

    /// Deliver a pre-serialized message to every subscriber registered when
    /// the call starts.
    ///
    /// Sends run concurrently. A failed send removes and closes that
    /// subscriber and never affects the others.
    #[tracing::instrument(name = "registry.broadcast", skip(self, payload), fields(bytes = payload.len()))]
    pub async fn broadcast_raw(&self, payload: Arc<str>) -> BroadcastResult {
        // Snapshot so no map guard is held across an await
        let subscribers: Vec<Arc<dyn Subscriber>> =
            self.subscribers.iter().map(|r| r.value().clone()).collect();

        if subscribers.is_empty() {
            return BroadcastResult::default();
        }

        let sends = subscribers.into_iter().map(move |subscriber| {
            let payload = payload.clone();
            async move {
                match subscriber.send(payload).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::debug!(
                            subscriber_id = %subscriber.id(),
                            error = %e,
                            "Send failed, removing subscriber"
                        );
                        self.evict(subscriber).await;
                        false
                    }
                }
            }
        });

        let outcomes = join_all(sends).await;
        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let result = BroadcastResult {
            delivered,
            failed: outcomes.len() - delivered,
        };

        BroadcastMetrics::record_broadcast(result.delivered as u64, result.failed as u64);
        tracing::debug!(delivered = result.delivered, failed = result.failed, "Broadcast complete");

        result
    }

    /// Remove and close every subscriber. Returns how many were closed.
    pub async fn close_all(&self) -> usize {
        let subscribers: Vec<Arc<dyn Subscriber>> =
            self.subscribers.iter().map(|r| r.value().clone()).collect();
        self.subscribers.clear();

        let count = subscribers.len();
        join_all(subscribers.iter().map(|s| s.close())).await;

        if count > 0 {
            tracing::info!(closed = count, "Closed all subscribers");
        }
        count
    }

    async fn evict(&self, subscriber: Arc<dyn Subscriber>) {
        // Absent means a concurrent disconnect already won
        if self.subscribers.remove(&subscriber.id()).is_some() {
            BroadcastMetrics::record_evicted();
            tracing::info!(subscriber_id = %subscriber.id(), "Subscriber evicted after failed send");
        }
        subscriber.close().await;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_manager::SendError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct RecordingSubscriber {
        id: Uuid,
        fail: bool,
        received: Mutex<Vec<String>>,
        closed: AtomicBool,
    }

    impl RecordingSubscriber {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                id: Uuid::new_v4(),
                fail,
                received: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            })
        }

        fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Subscriber for RecordingSubscriber {
        fn id(&self) -> Uuid {
            self.id
        }

        async fn send(&self, payload: Arc<str>) -> Result<(), SendError> {
            if self.fail {
                return Err(SendError::Transport("broken pipe".into()));
            }
            self.received.lock().unwrap().push(payload.to_string());
            Ok(())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_connect_and_disconnect() {
        let manager = ConnectionManager::new();
        let sub = RecordingSubscriber::new(false);

        let id = manager.connect(sub.clone());
        assert_eq!(id, sub.id);
        assert!(manager.contains(id));
        assert_eq!(manager.stats().total_connections, 1);

        assert!(manager.disconnect(id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_disconnect_absent_is_noop() {
        let manager = ConnectionManager::new();
        assert!(!manager.disconnect(Uuid::new_v4()));

        let sub = RecordingSubscriber::new(false);
        let id = manager.connect(sub);
        assert!(manager.disconnect(id));
        assert!(!manager.disconnect(id));
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_registry() {
        let manager = ConnectionManager::new();
        let mut n = Notification::new();
        n.insert("name".into(), json!("widget"));

        assert_eq!(manager.broadcast(&n).await, BroadcastResult::default());
    }

    #[tokio::test]
    async fn test_broadcast_delivers_serialized_notification() {
        let manager = ConnectionManager::new();
        let a = RecordingSubscriber::new(false);
        let b = RecordingSubscriber::new(false);
        manager.connect(a.clone());
        manager.connect(b.clone());

        let mut n = Notification::new();
        n.insert("name".into(), json!("widget"));
        n.insert("quantity".into(), json!(5));

        let result = manager.broadcast(&n).await;
        assert_eq!(result, BroadcastResult { delivered: 2, failed: 0 });

        for sub in [&a, &b] {
            let received = sub.received();
            assert_eq!(received.len(), 1);
            let decoded: serde_json::Value = serde_json::from_str(&received[0]).unwrap();
            assert_eq!(decoded, json!({"name": "widget", "quantity": 5}));
        }
    }

    #[tokio::test]
    async fn test_failed_subscriber_is_evicted_and_closed() {
        let manager = ConnectionManager::new();
        let first = RecordingSubscriber::new(false);
        let second = RecordingSubscriber::new(true);
        let third = RecordingSubscriber::new(false);
        manager.connect(first.clone());
        manager.connect(second.clone());
        manager.connect(third.clone());

        let result = manager.broadcast_raw(Arc::from("{}")).await;

        assert_eq!(result, BroadcastResult { delivered: 2, failed: 1 });
        assert_eq!(first.received(), vec!["{}".to_string()]);
        assert_eq!(third.received(), vec!["{}".to_string()]);
        assert!(!manager.contains(second.id));
        assert!(second.closed.load(Ordering::SeqCst));
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_close_all_empties_registry() {
        let manager = ConnectionManager::new();
        let a = RecordingSubscriber::new(false);
        let b = RecordingSubscriber::new(false);
        manager.connect(a.clone());
        manager.connect(b.clone());

        assert_eq!(manager.close_all().await, 2);
        assert!(manager.is_empty());
        assert!(a.closed.load(Ordering::SeqCst));
        assert!(b.closed.load(Ordering::SeqCst));
    }
}
