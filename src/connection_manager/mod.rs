//! Subscriber fan-out registry.
//!
//! - `types`: the [`Subscriber`] trait, [`ConnectionHandle`] and [`SendError`]
//! - `registry`: [`ConnectionManager`], the concurrent subscriber set and broadcaster

mod registry;
mod types;

pub use registry::{BroadcastResult, ConnectionManager};
pub use types::{ConnectionHandle, ConnectionStats, SendError, Subscriber};
