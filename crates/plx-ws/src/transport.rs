//! Pub/sub transport seam.
//!
//! The session protocol itself (WAMP handshake, framing, reconnection) lives
//! behind these traits. The feed client only needs to connect once, attach a
//! handler to a topic, and detach it again.

use crate::error::WsResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Receives publications for one topic.
///
/// The transport awaits `on_event` for each publication, with at most one
/// call in flight per topic and in arrival order. Calls for different topics
/// may run concurrently.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// `args` are the positional arguments, `details` the metadata map
    /// (e.g. `seq`).
    async fn on_event(&self, args: Vec<Value>, details: Map<String, Value>);
}

/// An established pub/sub session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PubSubSession: Send + Sync {
    /// Start delivering `topic` to `handler`, replacing any handler already
    /// attached to that topic.
    async fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) -> WsResult<()>;

    /// Stop delivering `topic` and release its handler.
    async fn unsubscribe(&self, topic: &str) -> WsResult<()>;
}

/// Opens sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PubSubConnector: Send + Sync {
    async fn connect(&self) -> WsResult<Arc<dyn PubSubSession>>;
}
