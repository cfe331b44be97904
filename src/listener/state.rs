use std::fmt;

use serde::Serialize;

/// Lifecycle of the upstream subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not started yet
    #[default]
    Disconnected,
    /// Opening the connection and issuing LISTEN
    Connecting,
    /// Subscribed and waiting for notifications
    Listening,
    /// Waiting out the fixed delay after a failure
    Reconnecting,
    /// Stopped by `stop()`
    Stopped,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Listening => "listening",
            Self::Reconnecting => "reconnecting",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
