//! Core domain types for the Poloniex real-time feed client.
//!
//! This crate provides the values that flow out of the feed:
//! - `TickerEvent`: one market's ticker snapshot
//! - `OrderOrTradeEvent`: a sequenced batch of trades and order-book deltas
//! - `Price`, `Size`: precision-safe numeric types
//! - `parse_decimal`: lenient decimal parsing for loosely-typed JSON values

pub mod decimal;
pub mod error;
pub mod events;

pub use decimal::{parse_decimal, parse_decimal_str, Price, Size};
pub use error::{CoreError, Result};
pub use events::{
    EntryKind, OrderEntry, OrderOrTradeEvent, TickerEvent, TradeRecord, NEW_TRADE,
    SEQUENCE_SENTINEL, TRADE_DATE_FORMAT,
};
