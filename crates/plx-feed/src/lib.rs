//! Event decoders for the real-time feed.
//!
//! Turns the transport's positional payloads (an array of untyped values plus
//! a metadata map) into typed `TickerEvent` and `OrderOrTradeEvent` values.

pub mod error;
pub mod parser;

pub use error::{FeedError, FeedResult};
pub use parser::{
    decode_order_or_trade, decode_ticker, parse_trade_date, TICKER_FIELD_COUNT,
};
