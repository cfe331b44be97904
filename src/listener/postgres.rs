use async_trait::async_trait;
use sqlx::postgres::PgListener;

use crate::postgres::mask_database_url;

use super::connector::{ChannelConnector, ChannelStream, ListenerError};

/// PostgreSQL `LISTEN/NOTIFY` connector.
///
/// Each `connect` opens a dedicated connection; reconnection is left to the
/// caller so the listener's state machine sees every drop.
pub struct PgChannelConnector {
    url: String,
}

impl PgChannelConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ChannelConnector for PgChannelConnector {
    async fn connect(&self, channel: &str) -> Result<Box<dyn ChannelStream>, ListenerError> {
        tracing::debug!(url = %mask_database_url(&self.url), channel = %channel, "Opening LISTEN connection");

        let mut listener = PgListener::connect(&self.url).await?;
        listener.listen(channel).await?;

        Ok(Box::new(PgChannelStream { listener }))
    }
}

struct PgChannelStream {
    listener: PgListener,
}

#[async_trait]
impl ChannelStream for PgChannelStream {
    async fn recv(&mut self) -> Result<String, ListenerError> {
        // None: the connection dropped. The next try_recv would reconnect.
        match self.listener.try_recv().await? {
            Some(notification) => Ok(notification.payload().to_owned()),
            None => Err(ListenerError::ConnectionLost),
        }
    }

    async fn close(self: Box<Self>) {
        // Drop, not unlisten_all(): the connection may already be gone
        drop(self.listener);
        tracing::debug!("LISTEN connection closed");
    }
}
