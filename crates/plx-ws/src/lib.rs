//! Real-time feed client for the Poloniex pub/sub API.
//!
//! Provides:
//! - Connect-on-demand over a pluggable pub/sub transport
//! - A subscription registry keyed by topic, one table per event type
//! - Per-topic handlers that decode payloads and deliver them on
//!   bounded channels, with an explicit backpressure policy

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod subscription;
pub mod transport;

pub use client::{FeedClient, MarketReceiver, TickerReceiver, TICKER_TOPIC};
pub use config::{DeliveryPolicy, FeedConfig};
pub use error::{WsError, WsResult};
pub use handler::{FeedEvent, TopicHandler};
pub use subscription::{Subscription, SubscriptionRegistry, SubscriptionTable};
pub use transport::{EventHandler, PubSubConnector, PubSubSession};
