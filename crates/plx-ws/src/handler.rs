//! Per-topic event handlers.
//!
//! A [`TopicHandler`] is what the transport calls for each publication on a
//! subscribed topic. It decodes the payload and forwards the result to the
//! subscriber's channel according to the configured [`DeliveryPolicy`].
//! Because the transport awaits the handler, a blocked send holds back that
//! topic's dispatch and nothing else.

use crate::config::DeliveryPolicy;
use crate::subscription::{SubscriptionRegistry, SubscriptionTable};
use crate::transport::EventHandler;
use async_trait::async_trait;
use plx_core::{OrderOrTradeEvent, TickerEvent};
use plx_feed::{decode_order_or_trade, decode_ticker, FeedResult};
use plx_telemetry::Metrics;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// An event type a topic can carry.
pub trait FeedEvent: Send + Sized + 'static {
    /// Metric and log label.
    const KIND: &'static str;

    fn decode(args: &[Value], details: &Map<String, Value>) -> FeedResult<Self>;

    /// The registry table holding subscriptions of this type.
    fn table(registry: &mut SubscriptionRegistry) -> &mut SubscriptionTable<Self>;
}

impl FeedEvent for TickerEvent {
    const KIND: &'static str = "ticker";

    fn decode(args: &[Value], _details: &Map<String, Value>) -> FeedResult<Self> {
        decode_ticker(args)
    }

    fn table(registry: &mut SubscriptionRegistry) -> &mut SubscriptionTable<Self> {
        &mut registry.tickers
    }
}

impl FeedEvent for OrderOrTradeEvent {
    const KIND: &'static str = "market";

    fn decode(args: &[Value], details: &Map<String, Value>) -> FeedResult<Self> {
        decode_order_or_trade(args, details)
    }

    fn table(registry: &mut SubscriptionRegistry) -> &mut SubscriptionTable<Self> {
        &mut registry.markets
    }
}

/// Decodes publications for one topic and delivers them to its subscriber.
pub struct TopicHandler<E> {
    topic: String,
    sender: mpsc::Sender<E>,
    cancel: CancellationToken,
    policy: DeliveryPolicy,
}

impl<E: FeedEvent> TopicHandler<E> {
    pub fn new(
        topic: impl Into<String>,
        sender: mpsc::Sender<E>,
        cancel: CancellationToken,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            topic: topic.into(),
            sender,
            cancel,
            policy,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn deliver(&self, event: E) {
        match self.policy {
            DeliveryPolicy::Block => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        trace!(topic = %self.topic, "Send abandoned, subscription cancelled");
                        Metrics::event_dropped(E::KIND, "cancelled");
                    }
                    result = self.sender.send(event) => match result {
                        Ok(()) => Metrics::event_delivered(E::KIND),
                        Err(_) => {
                            debug!(topic = %self.topic, "Receiver closed, event dropped");
                            Metrics::event_dropped(E::KIND, "closed");
                        }
                    },
                }
            }
            DeliveryPolicy::DropNewest if self.cancel.is_cancelled() => {
                Metrics::event_dropped(E::KIND, "cancelled");
            }
            DeliveryPolicy::DropNewest => match self.sender.try_send(event) {
                Ok(()) => Metrics::event_delivered(E::KIND),
                Err(TrySendError::Full(_)) => {
                    warn!(topic = %self.topic, "Subscriber channel full, event dropped");
                    Metrics::event_dropped(E::KIND, "full");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(topic = %self.topic, "Receiver closed, event dropped");
                    Metrics::event_dropped(E::KIND, "closed");
                }
            },
        }
    }
}

#[async_trait]
impl<E: FeedEvent> EventHandler for TopicHandler<E> {
    async fn on_event(&self, args: Vec<Value>, details: Map<String, Value>) {
        if self.cancel.is_cancelled() {
            trace!(topic = %self.topic, "Publication after unsubscribe ignored");
            return;
        }

        let event = match E::decode(&args, &details) {
            Ok(event) => event,
            Err(e) => {
                warn!(topic = %self.topic, kind = E::KIND, error = %e, "Dropping undecodable message");
                Metrics::decode_failed(E::KIND);
                return;
            }
        };

        self.deliver(event).await;
    }
}
