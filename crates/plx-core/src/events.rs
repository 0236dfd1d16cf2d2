//! Typed events delivered by the real-time feed.
//!
//! The transport hands over loosely-typed positional payloads; these are the
//! shapes they are normalized into before reaching a subscriber.

use crate::decimal::{parse_decimal, Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sequence value used when a message carried no `seq` metadata.
///
/// Reserved by convention; the exchange never sends negative sequences.
pub const SEQUENCE_SENTINEL: i64 = -1;

/// Entry tag for an executed trade.
pub const NEW_TRADE: &str = "newTrade";

/// Layout of `TradeRecord::raw_date` (exchange-local, no zone).
pub const TRADE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One market's ticker snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEvent {
    /// Currency pair, e.g. "BTC_ETH".
    pub pair: String,
    pub last: Price,
    pub ask: Price,
    pub bid: Price,
    /// 24h change as a fraction (0.05 = 5%).
    pub percent_change: Decimal,
    pub base_volume: Size,
    pub quote_volume: Size,
    pub is_frozen: bool,
    pub daily_high: Price,
    pub daily_low: Price,
}

impl TickerEvent {
    /// 24h change expressed in percent.
    pub fn percent_change_pct(&self) -> Decimal {
        self.percent_change * Decimal::ONE_HUNDRED
    }
}

/// A single trade or order-book delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(
        rename = "tradeID",
        alias = "tradeId",
        default,
        deserialize_with = "string_or_number"
    )]
    pub trade_id: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub rate: Price,
    #[serde(default, deserialize_with = "lenient_size")]
    pub amount: Size,
    /// Side tag of the record itself (`buy`/`sell` for trades, `bid`/`ask` for book deltas).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(
        rename = "date",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub raw_date: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_option_decimal"
    )]
    pub total: Option<Decimal>,
    /// Parsed `raw_date`, only populated for `newTrade` entries.
    #[serde(skip)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Classification of an entry tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    NewTrade,
    OrderBookModify,
    OrderBookRemove,
    Other(String),
}

impl EntryKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            NEW_TRADE => Self::NewTrade,
            "orderBookModify" => Self::OrderBookModify,
            "orderBookRemove" => Self::OrderBookRemove,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One element of an order/trade batch: the entry tag plus its record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: TradeRecord,
}

impl OrderEntry {
    pub fn entry_kind(&self) -> EntryKind {
        EntryKind::from_tag(&self.kind)
    }

    pub fn is_trade(&self) -> bool {
        self.kind == NEW_TRADE
    }
}

/// One batched transport message for a subscribed market.
///
/// `entries` keep delivery order. `sequence` is exposed as received; gaps
/// and reordering across messages are for the consumer to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderOrTradeEvent {
    pub sequence: i64,
    pub entries: Vec<OrderEntry>,
}

impl OrderOrTradeEvent {
    pub fn has_sequence(&self) -> bool {
        self.sequence != SEQUENCE_SENTINEL
    }

    /// Executed trades in delivery order.
    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.entries
            .iter()
            .filter(|entry| entry.is_trade())
            .map(|entry| &entry.data)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_decimal(&value).map_err(serde::de::Error::custom)
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Price, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_decimal(deserializer).map(Price::new)
}

fn lenient_size<'de, D>(deserializer: D) -> Result<Size, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_decimal(deserializer).map(Size::new)
}

fn lenient_option_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => parse_decimal(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
