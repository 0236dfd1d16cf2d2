//! Subscription registry.
//!
//! Tracks which topics are active and the cancellation handle of each
//! topic's handler. Ticker and market subscriptions live in separate tables
//! because their channels carry different event types. The registry does no
//! I/O; the feed client guards it with a single lock.

use plx_core::{OrderOrTradeEvent, TickerEvent};
use std::collections::HashMap;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// An active subscription.
///
/// Dropping it cancels the topic's handler, so an entry that is removed or
/// overwritten stops delivering.
#[derive(Debug)]
pub struct Subscription<E> {
    id: u64,
    cancel: CancellationToken,
    _event: PhantomData<fn() -> E>,
}

impl<E> Subscription<E> {
    pub fn new(id: u64, cancel: CancellationToken) -> Self {
        Self {
            id,
            cancel,
            _event: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Subscriptions for one event type, keyed by topic.
#[derive(Debug)]
pub struct SubscriptionTable<E> {
    entries: HashMap<String, Subscription<E>>,
}

impl<E> SubscriptionTable<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert or overwrite the entry for `topic`, returning the one replaced.
    pub fn register(&mut self, topic: &str, subscription: Subscription<E>) -> Option<Subscription<E>> {
        self.entries.insert(topic.to_string(), subscription)
    }

    /// Remove the entry for `topic`. No-op if absent.
    pub fn unregister(&mut self, topic: &str) -> Option<Subscription<E>> {
        self.entries.remove(topic)
    }

    /// Remove the entry for `topic` only if it is still the one with `id`.
    pub fn unregister_id(&mut self, topic: &str, id: u64) -> Option<Subscription<E>> {
        if self.entries.get(topic).is_some_and(|sub| sub.id() == id) {
            self.entries.remove(topic)
        } else {
            None
        }
    }

    pub fn is_active(&self, topic: &str) -> bool {
        self.entries.contains_key(topic)
    }

    pub fn get(&self, topic: &str) -> Option<&Subscription<E>> {
        self.entries.get(topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for SubscriptionTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// All subscriptions held by a feed client.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    pub tickers: SubscriptionTable<TickerEvent>,
    pub markets: SubscriptionTable<OrderOrTradeEvent>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `topic` from whichever table holds it.
    ///
    /// Returns false if the topic was not active.
    pub fn unregister(&mut self, topic: &str) -> bool {
        let ticker = self.tickers.unregister(topic).is_some();
        let market = self.markets.unregister(topic).is_some();
        ticker || market
    }

    pub fn is_active(&self, topic: &str) -> bool {
        self.tickers.is_active(topic) || self.markets.is_active(topic)
    }

    /// Active topics, sorted.
    pub fn active_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .tickers
            .topics()
            .chain(self.markets.topics())
            .map(str::to_string)
            .collect();
        topics.sort();
        topics.dedup();
        topics
    }

    pub fn len(&self) -> usize {
        self.tickers.len() + self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty() && self.markets.is_empty()
    }
}
