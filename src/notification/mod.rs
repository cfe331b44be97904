//! Notification payloads and the handlers that consume them.

mod broadcast;
mod handler;
mod types;

pub use broadcast::BroadcastHandler;
pub use handler::{handler_fn, FnHandler, NotificationHandler};
pub use types::{decode, DecodeError, Notification};
