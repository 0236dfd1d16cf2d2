//! Feed client.
//!
//! Owns the pub/sub session and the subscription registry. The session is
//! opened by the first subscribe and reused for the lifetime of the client.
//!
//! Subscribe and unsubscribe for the same topic are serialized by a per-topic
//! async lock held across the transport call, so the registry and the
//! transport always agree on which handler owns a topic. The registry lock
//! itself is never held across an await.

use crate::config::FeedConfig;
use crate::error::{WsError, WsResult};
use crate::handler::{FeedEvent, TopicHandler};
use crate::subscription::{Subscription, SubscriptionRegistry};
use crate::transport::{PubSubConnector, PubSubSession};
use parking_lot::Mutex;
use plx_core::{OrderOrTradeEvent, TickerEvent};
use plx_telemetry::Metrics;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Topic carrying ticker updates for every market.
pub const TICKER_TOPIC: &str = "ticker";

pub type TickerReceiver = mpsc::Receiver<TickerEvent>;
pub type MarketReceiver = mpsc::Receiver<OrderOrTradeEvent>;

/// Subscribes to real-time topics and hands out per-topic event channels.
pub struct FeedClient {
    connector: Arc<dyn PubSubConnector>,
    session: OnceCell<Arc<dyn PubSubSession>>,
    registry: Mutex<SubscriptionRegistry>,
    topic_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    config: FeedConfig,
    next_id: AtomicU64,
}

impl FeedClient {
    /// Create a client with the default configuration. Nothing connects
    /// until the first subscribe.
    pub fn new(connector: Arc<dyn PubSubConnector>) -> Self {
        Self::build(connector, FeedConfig::default())
    }

    pub fn with_config(connector: Arc<dyn PubSubConnector>, config: FeedConfig) -> WsResult<Self> {
        config.validate()?;
        Ok(Self::build(connector, config))
    }

    fn build(connector: Arc<dyn PubSubConnector>, config: FeedConfig) -> Self {
        Self {
            connector,
            session: OnceCell::new(),
            registry: Mutex::new(SubscriptionRegistry::new()),
            topic_locks: Mutex::new(HashMap::new()),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.session.initialized()
    }

    /// Return the session, connecting on first use.
    ///
    /// Concurrent callers share one connection attempt. A failed attempt is
    /// not cached, so the next call tries again.
    async fn session(&self) -> WsResult<Arc<dyn PubSubSession>> {
        let session = self
            .session
            .get_or_try_init(|| async {
                info!("Connecting to pub/sub transport");
                match self.connector.connect().await {
                    Ok(session) => {
                        info!("Pub/sub session established");
                        Metrics::ws_connected();
                        Ok(session)
                    }
                    Err(e) => {
                        warn!(error = %e, "Pub/sub connect failed");
                        Err(match e {
                            WsError::ConnectionFailed(msg) => WsError::ConnectionFailed(msg),
                            other => WsError::ConnectionFailed(other.to_string()),
                        })
                    }
                }
            })
            .await?;
        Ok(Arc::clone(session))
    }

    fn topic_lock(&self, topic: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.topic_locks.lock().entry(topic.to_string()).or_default())
    }

    /// Subscribe `topic`, decoding its publications as `E`.
    ///
    /// Subscribing a topic that is already active replaces the previous
    /// subscription; its receiver is closed.
    pub async fn subscribe<E: FeedEvent>(&self, topic: &str) -> WsResult<mpsc::Receiver<E>> {
        let session = self.session().await?;
        let topic_lock = self.topic_lock(topic);
        let _guard = topic_lock.lock().await;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let cancel = CancellationToken::new();
        let handler = Arc::new(TopicHandler::new(
            topic,
            tx,
            cancel.clone(),
            self.config.delivery,
        ));

        let replaced = {
            let mut registry = self.registry.lock();
            let replaced = E::table(&mut registry).register(topic, Subscription::new(id, cancel));
            Metrics::active_subscriptions(registry.len());
            replaced
        };
        if let Some(previous) = replaced {
            debug!(topic, previous_id = previous.id(), "Replacing existing subscription");
        }

        if let Err(e) = session.subscribe(topic, handler).await {
            warn!(topic, error = %e, "Transport subscribe failed, rolling back");
            let mut registry = self.registry.lock();
            E::table(&mut registry).unregister_id(topic, id);
            Metrics::active_subscriptions(registry.len());
            return Err(WsError::SubscriptionError(format!("{topic}: {e}")));
        }

        info!(topic, kind = E::KIND, "Subscribed");
        Ok(rx)
    }

    /// Unsubscribe `topic`.
    ///
    /// No-op when never connected or when the topic is not active. Once this
    /// returns, no further event for the topic reaches its channel.
    pub async fn unsubscribe(&self, topic: &str) -> WsResult<()> {
        let Some(session) = self.session.get() else {
            debug!(topic, "Unsubscribe before connect ignored");
            return Ok(());
        };
        let topic_lock = self.topic_lock(topic);
        let _guard = topic_lock.lock().await;

        let removed = {
            let mut registry = self.registry.lock();
            let removed = registry.unregister(topic);
            Metrics::active_subscriptions(registry.len());
            removed
        };
        if !removed {
            debug!(topic, "Unsubscribe of inactive topic ignored");
            return Ok(());
        }

        if let Err(e) = session.unsubscribe(topic).await {
            warn!(topic, error = %e, "Transport unsubscribe failed");
        }
        info!(topic, "Unsubscribed");
        Ok(())
    }

    pub async fn subscribe_ticker(&self) -> WsResult<TickerReceiver> {
        self.subscribe::<TickerEvent>(TICKER_TOPIC).await
    }

    /// Subscribe order-book and trade updates for one market (e.g. `BTC_ETH`).
    pub async fn subscribe_market(&self, code: &str) -> WsResult<MarketReceiver> {
        self.subscribe::<OrderOrTradeEvent>(code).await
    }

    pub async fn unsubscribe_ticker(&self) -> WsResult<()> {
        self.unsubscribe(TICKER_TOPIC).await
    }

    pub async fn unsubscribe_market(&self, code: &str) -> WsResult<()> {
        self.unsubscribe(code).await
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.registry.lock().is_active(topic)
    }

    /// Active topics, sorted.
    pub fn active_topics(&self) -> Vec<String> {
        self.registry.lock().active_topics()
    }
}
