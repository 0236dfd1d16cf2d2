//! In-memory pub/sub transport for feed client tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use plx_ws::{EventHandler, PubSubConnector, PubSubSession, WsError, WsResult};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Session that keeps handlers in a map and lets the test publish to them.
#[derive(Default)]
pub struct FakeSession {
    handlers: Mutex<HashMap<String, Arc<dyn EventHandler>>>,
    unsubscribes: AtomicUsize,
    subscribe_delay_ms: AtomicU64,
    unsubscribe_delay_ms: AtomicU64,
}

impl FakeSession {
    pub fn handler(&self, topic: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers.lock().get(topic).cloned()
    }

    /// Deliver one publication and wait for the handler to return.
    /// Returns false if nothing is attached to `topic`.
    pub async fn publish(&self, topic: &str, args: Vec<Value>, details: Map<String, Value>) -> bool {
        let Some(handler) = self.handler(topic) else {
            return false;
        };
        handler.on_event(args, details).await;
        true
    }

    /// Stall every transport subscribe by `delay` before attaching the handler.
    pub fn set_subscribe_delay(&self, delay: Duration) {
        self.subscribe_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Stall every transport unsubscribe by `delay` before detaching the handler.
    pub fn set_unsubscribe_delay(&self, delay: Duration) {
        self.unsubscribe_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.handlers.lock().keys().cloned().collect();
        topics.sort();
        topics
    }
}

#[async_trait]
impl PubSubSession for FakeSession {
    async fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) -> WsResult<()> {
        stall(&self.subscribe_delay_ms).await;
        self.handlers.lock().insert(topic.to_string(), handler);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> WsResult<()> {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        stall(&self.unsubscribe_delay_ms).await;
        self.handlers.lock().remove(topic);
        Ok(())
    }
}

async fn stall(delay_ms: &AtomicU64) {
    let ms = delay_ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Connector handing out one shared [`FakeSession`].
pub struct FakeConnector {
    pub session: Arc<FakeSession>,
    connects: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session: Arc::new(FakeSession::default()),
            connects: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        })
    }

    /// Make the next connect attempt fail.
    pub fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PubSubConnector for FakeConnector {
    async fn connect(&self) -> WsResult<Arc<dyn PubSubSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(WsError::ConnectionFailed("router unreachable".to_string()));
        }
        let session: Arc<dyn PubSubSession> = self.session.clone();
        Ok(session)
    }
}

/// Positional ticker payload.
pub fn ticker_args(pair: &str, last: &str) -> Vec<Value> {
    vec![
        json!(pair),
        json!(last),
        json!("0.02510000"),
        json!("0.02490000"),
        json!("0.05"),
        json!("1500.5"),
        json!("37.2"),
        json!(0),
        json!("0.02600000"),
        json!("0.02400000"),
    ]
}

pub fn seq_details(seq: i64) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("seq".to_string(), json!(seq));
    details
}

pub fn trade_entry(trade_id: u64, rate: &str, date: &str) -> Value {
    json!({
        "type": "newTrade",
        "data": {
            "tradeID": trade_id.to_string(),
            "rate": rate,
            "amount": "1.5",
            "type": "buy",
            "date": date,
            "total": "0.0375"
        }
    })
}

pub fn book_entry(kind: &str, rate: &str, amount: &str) -> Value {
    json!({
        "type": kind,
        "data": { "type": "bid", "rate": rate, "amount": amount }
    })
}
