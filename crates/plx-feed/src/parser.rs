//! Decoding of positional transport payloads.
//!
//! Two failure policies apply:
//! - Ticker: each numeric slot is parsed on its own. A bad slot is logged and
//!   left at zero; the event is still produced.
//! - Order/trade batch: a malformed shape fails the whole message. A bad
//!   trade date only leaves that record's `timestamp` unset.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use plx_core::{
    parse_decimal, OrderEntry, OrderOrTradeEvent, Price, Size, TickerEvent, SEQUENCE_SENTINEL,
    TRADE_DATE_FORMAT,
};
use plx_telemetry::Metrics;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Positional slots in a ticker payload:
/// `[pair, last, ask, bid, percentChange, baseVolume, quoteVolume, isFrozen, dailyHigh, dailyLow]`.
pub const TICKER_FIELD_COUNT: usize = 10;

/// Metadata key carrying the message sequence number.
const SEQ_KEY: &str = "seq";

/// Decode a ticker payload.
///
/// Fails only when the payload is too short or the pair is not a string.
/// Every numeric field degrades to zero independently on parse failure.
pub fn decode_ticker(args: &[Value]) -> FeedResult<TickerEvent> {
    if args.len() < TICKER_FIELD_COUNT {
        return Err(FeedError::MissingField(format!(
            "ticker payload has {} of {} slots",
            args.len(),
            TICKER_FIELD_COUNT
        )));
    }

    let pair = args[0]
        .as_str()
        .ok_or_else(|| FeedError::InvalidData(format!("ticker pair is not a string: {}", args[0])))?
        .to_string();

    let field = |idx: usize, name: &'static str| decimal_field(&pair, &args[idx], name);

    let ticker = TickerEvent {
        last: field(1, "last").map(Price::new).unwrap_or_default(),
        ask: field(2, "ask").map(Price::new).unwrap_or_default(),
        bid: field(3, "bid").map(Price::new).unwrap_or_default(),
        percent_change: field(4, "percent_change").unwrap_or_default(),
        base_volume: field(5, "base_volume").map(Size::new).unwrap_or_default(),
        quote_volume: field(6, "quote_volume").map(Size::new).unwrap_or_default(),
        is_frozen: field(7, "is_frozen").is_some_and(|flag| !flag.is_zero()),
        daily_high: field(8, "daily_high").map(Price::new).unwrap_or_default(),
        daily_low: field(9, "daily_low").map(Price::new).unwrap_or_default(),
        pair,
    };

    Ok(ticker)
}

/// Decode an order/trade batch.
///
/// `sequence` comes from `details["seq"]`, or [`SEQUENCE_SENTINEL`] when
/// absent. Entries keep the order the transport delivered them in.
pub fn decode_order_or_trade(
    args: &[Value],
    details: &Map<String, Value>,
) -> FeedResult<OrderOrTradeEvent> {
    let sequence = extract_sequence(details);

    let bytes = serde_json::to_vec(args)?;
    let mut entries: Vec<OrderEntry> = serde_json::from_slice(&bytes)
        .map_err(|e| FeedError::Structure(format!("order/trade batch: {e}")))?;

    for entry in entries.iter_mut().filter(|entry| entry.is_trade()) {
        match parse_trade_date(&entry.data.raw_date) {
            Ok(ts) => entry.data.timestamp = Some(ts),
            Err(e) => {
                warn!(
                    sequence,
                    trade_id = %entry.data.trade_id,
                    error = %e,
                    "Trade date unparsable, timestamp left unset"
                );
                Metrics::timestamp_failed();
            }
        }
    }

    debug!(sequence, entries = entries.len(), "Order/trade batch decoded");
    Ok(OrderOrTradeEvent { sequence, entries })
}

/// Parse an exchange trade date (`YYYY-MM-DD HH:MM:SS`) as UTC.
pub fn parse_trade_date(raw: &str) -> FeedResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TRADE_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| FeedError::TimestampParse {
            date: raw.to_string(),
            source,
        })
}

fn decimal_field(pair: &str, value: &Value, field: &'static str) -> Option<Decimal> {
    match parse_decimal(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(pair, field, error = %e, "Ticker field parse failed, leaving zero");
            Metrics::field_failed(field);
            None
        }
    }
}

fn extract_sequence(details: &Map<String, Value>) -> i64 {
    match details.get(SEQ_KEY) {
        None => SEQUENCE_SENTINEL,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(SEQUENCE_SENTINEL),
        Some(other) => {
            debug!(seq = %other, "Non-numeric seq treated as absent");
            SEQUENCE_SENTINEL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use plx_core::EntryKind;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn ticker_args() -> Vec<Value> {
        vec![
            json!("BTC_ETH"),
            json!("0.02510000"),
            json!("0.02515000"),
            json!("0.02505000"),
            json!("0.0342"),
            json!("1823.44"),
            json!("72619.02"),
            json!(0),
            json!("0.02600000"),
            json!("0.02400000"),
        ]
    }

    fn details(seq: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("seq".to_string(), seq);
        map
    }

    #[test]
    fn test_decode_ticker_all_fields() {
        let ticker = decode_ticker(&ticker_args()).unwrap();

        assert_eq!(ticker.pair, "BTC_ETH");
        assert_eq!(ticker.last, Price::new(dec!(0.0251)));
        assert_eq!(ticker.ask, Price::new(dec!(0.02515)));
        assert_eq!(ticker.bid, Price::new(dec!(0.02505)));
        assert_eq!(ticker.percent_change, dec!(0.0342));
        assert_eq!(ticker.base_volume, Size::new(dec!(1823.44)));
        assert_eq!(ticker.quote_volume, Size::new(dec!(72619.02)));
        assert!(!ticker.is_frozen);
        assert_eq!(ticker.daily_high, Price::new(dec!(0.026)));
        assert_eq!(ticker.daily_low, Price::new(dec!(0.024)));
    }

    #[test]
    fn test_decode_ticker_frozen_flag() {
        let mut args = ticker_args();
        args[7] = json!("1");
        assert!(decode_ticker(&args).unwrap().is_frozen);

        args[7] = json!(0.0);
        assert!(!decode_ticker(&args).unwrap().is_frozen);

        args[7] = json!("garbage");
        assert!(!decode_ticker(&args).unwrap().is_frozen);
    }

    #[test]
    fn test_decode_ticker_bad_bid_degrades_to_zero() {
        let mut args = ticker_args();
        args[3] = json!("not-a-number");

        let ticker = decode_ticker(&args).unwrap();

        assert!(ticker.bid.is_zero());
        assert_eq!(ticker.last, Price::new(dec!(0.0251)));
        assert_eq!(ticker.ask, Price::new(dec!(0.02515)));
        assert_eq!(ticker.quote_volume, Size::new(dec!(72619.02)));
        assert_eq!(ticker.daily_low, Price::new(dec!(0.024)));
    }

    #[test]
    fn test_decode_ticker_accepts_numeric_slots() {
        let mut args = ticker_args();
        args[1] = json!(0.0251);
        args[5] = json!(1823);

        let ticker = decode_ticker(&args).unwrap();
        assert_eq!(ticker.last, Price::new(dec!(0.0251)));
        assert_eq!(ticker.base_volume, Size::new(dec!(1823)));
    }

    #[test]
    fn test_decode_ticker_short_payload() {
        let args = &ticker_args()[..9];
        assert!(matches!(
            decode_ticker(args),
            Err(FeedError::MissingField(_))
        ));
    }

    #[test]
    fn test_decode_ticker_non_string_pair() {
        let mut args = ticker_args();
        args[0] = json!(148);
        assert!(matches!(
            decode_ticker(&args),
            Err(FeedError::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_order_missing_seq_uses_sentinel() {
        let args = vec![json!({"type": "orderBookModify", "data": {"type": "bid", "rate": "0.0251", "amount": "3"}})];

        let event = decode_order_or_trade(&args, &Map::new()).unwrap();

        assert_eq!(event.sequence, SEQUENCE_SENTINEL);
        assert!(!event.has_sequence());
        assert_eq!(event.entries.len(), 1);
    }

    #[test]
    fn test_decode_order_seq_and_order_preserved() {
        let args = vec![
            json!({"type": "orderBookRemove", "data": {"type": "ask", "rate": "0.0260"}}),
            json!({"type": "orderBookModify", "data": {"type": "bid", "rate": "0.0250", "amount": "1.25"}}),
        ];

        let event = decode_order_or_trade(&args, &details(json!(42))).unwrap();

        assert_eq!(event.sequence, 42);
        assert_eq!(event.entries.len(), 2);
        assert_eq!(event.entries[0].entry_kind(), EntryKind::OrderBookRemove);
        assert_eq!(event.entries[0].data.rate, Price::new(dec!(0.026)));
        assert_eq!(event.entries[1].entry_kind(), EntryKind::OrderBookModify);
        assert_eq!(event.entries[1].data.amount, Size::new(dec!(1.25)));
    }

    #[test]
    fn test_decode_order_float_seq() {
        let event = decode_order_or_trade(&[], &details(json!(7.0))).unwrap();
        assert_eq!(event.sequence, 7);
        assert!(event.entries.is_empty());
    }

    #[test]
    fn test_decode_order_non_numeric_seq() {
        let event = decode_order_or_trade(&[], &details(json!("12"))).unwrap();
        assert_eq!(event.sequence, SEQUENCE_SENTINEL);
    }

    #[test]
    fn test_new_trade_timestamp_parsed() {
        let args = vec![json!({
            "type": "newTrade",
            "data": {
                "tradeID": "364476",
                "rate": "0.0251",
                "amount": "0.5",
                "date": "2021-06-01 12:00:00",
                "total": "0.01255",
                "type": "buy"
            }
        })];

        let event = decode_order_or_trade(&args, &details(json!(9))).unwrap();
        let trade = &event.entries[0].data;

        assert_eq!(
            trade.timestamp,
            Some(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(trade.trade_id, "364476");
    }

    #[test]
    fn test_new_trade_bad_date_kept_without_timestamp() {
        let args = vec![
            json!({"type": "newTrade", "data": {"tradeID": "1", "rate": "1", "amount": "1", "date": "not-a-date", "type": "sell"}}),
            json!({"type": "newTrade", "data": {"tradeID": "2", "rate": "1", "amount": "1", "date": "2021-06-01 12:00:01", "type": "buy"}}),
        ];

        let event = decode_order_or_trade(&args, &Map::new()).unwrap();

        assert_eq!(event.entries.len(), 2);
        assert_eq!(event.entries[0].data.trade_id, "1");
        assert!(event.entries[0].data.timestamp.is_none());
        assert!(event.entries[1].data.timestamp.is_some());
    }

    #[test]
    fn test_book_delta_date_not_parsed() {
        let args = vec![json!({"type": "orderBookModify", "data": {"type": "bid", "rate": "1", "amount": "1", "date": "2021-06-01 12:00:00"}})];

        let event = decode_order_or_trade(&args, &Map::new()).unwrap();
        assert!(event.entries[0].data.timestamp.is_none());
    }

    #[test]
    fn test_decode_order_malformed_shape() {
        let args = vec![json!({"type": "newTrade", "data": {"rate": "1"}}), json!(17)];

        assert!(matches!(
            decode_order_or_trade(&args, &Map::new()),
            Err(FeedError::Structure(_))
        ));
    }

    #[test]
    fn test_parse_trade_date() {
        let ts = parse_trade_date("2021-06-01 12:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap());

        assert!(matches!(
            parse_trade_date("2021-06-01T12:00:00Z"),
            Err(FeedError::TimestampParse { .. })
        ));
    }
}
