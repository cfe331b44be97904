//! Reliable upstream channel listener.
//!
//! [`ChannelListener`] keeps one subscription to a named channel alive across
//! connection loss and dispatches each decoded payload to its handlers.
//! The upstream is reached through [`ChannelConnector`]; production uses
//! [`PgChannelConnector`] (PostgreSQL `LISTEN/NOTIFY`).

mod channel_listener;
mod connector;
mod postgres;
mod state;

pub use channel_listener::{ChannelListener, DEFAULT_RECONNECT_DELAY, MIN_RECONNECT_DELAY};
pub use connector::{ChannelConnector, ChannelStream, ListenerError};
pub use postgres::PgChannelConnector;
pub use state::ConnectionState;
