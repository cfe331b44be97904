//! Subscriber abstraction and the WebSocket-backed connection handle

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Why a send to a subscriber failed
#[derive(Debug, Clone, Error)]
pub enum SendError {
    #[error("subscriber connection is closed")]
    Closed,

    #[error("send did not complete within {0:?}")]
    TimedOut(Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

/// A live downstream connection that receives broadcasts.
///
/// The transport that created the connection owns it; the registry only holds
/// a reference while the subscriber is a member.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Stable identity used for registry membership.
    fn id(&self) -> Uuid;

    /// Deliver one serialized message.
    async fn send(&self, payload: Arc<str>) -> Result<(), SendError>;

    /// Ask the transport to tear the connection down.
    async fn close(&self);
}

/// Handle for a single WebSocket connection.
///
/// Sends go through a bounded queue drained by the connection's writer task.
pub struct ConnectionHandle {
    pub id: Uuid,
    sender: mpsc::Sender<Arc<str>>,
    send_timeout: Duration,
    closed: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<Arc<str>>, send_timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            send_timeout,
            closed: CancellationToken::new(),
        }
    }

    /// Resolves once [`Subscriber::close`] has been called on this handle.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.sender.is_closed()
    }
}

#[async_trait]
impl Subscriber for ConnectionHandle {
    fn id(&self) -> Uuid {
        self.id
    }

    async fn send(&self, payload: Arc<str>) -> Result<(), SendError> {
        if self.closed.is_cancelled() {
            return Err(SendError::Closed);
        }

        match timeout(self.send_timeout, self.sender.send(payload)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendError::Closed),
            Err(_) => Err(SendError::TimedOut(self.send_timeout)),
        }
    }

    async fn close(&self) {
        self.closed.cancel();
    }
}

/// Registry statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
}
