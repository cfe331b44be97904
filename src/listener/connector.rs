use async_trait::async_trait;
use thiserror::Error;

/// Failures while connecting to or listening on the upstream channel.
/// All of them route the listener to its reconnect branch.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("upstream connection lost")]
    ConnectionLost,

    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Opens subscriptions to a named upstream channel.
#[async_trait]
pub trait ChannelConnector: Send + Sync + 'static {
    /// Connect and subscribe to `channel`.
    async fn connect(&self, channel: &str) -> Result<Box<dyn ChannelStream>, ListenerError>;
}

/// A live subscription yielding raw payloads.
#[async_trait]
pub trait ChannelStream: Send {
    /// Wait for the next payload. An error means the subscription is gone.
    async fn recv(&mut self) -> Result<String, ListenerError>;

    /// Release the underlying connection.
    async fn close(self: Box<Self>);
}
