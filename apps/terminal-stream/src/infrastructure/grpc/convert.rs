//! Reply Conversion
//!
//! Maps terminal reply messages to domain events. A reply carries either
//! data or an in-band error; the error wins when both are present, and a
//! reply with neither is skipped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use super::proto::terminal::v1 as pb;
use crate::application::ports::TransportFault;
use crate::domain::streaming::{
    PositionProfit, PositionProfitUpdate, StreamEvent, TicketListSnapshot, Tick, TradeEvent,
    TradeEventKind,
};

/// Code used when the terminal sends an error without one.
const UNSPECIFIED_ERROR_CODE: &str = "UNSPECIFIED";

/// A reply message that may carry one event.
pub trait IntoStreamEvent {
    /// `None` for an empty reply, otherwise the event or the in-band error.
    fn into_stream_event(self) -> Option<Result<StreamEvent, TransportFault>>;
}

impl IntoStreamEvent for pb::OnTickReply {
    fn into_stream_event(self) -> Option<Result<StreamEvent, TransportFault>> {
        if let Some(fault) = api_fault(self.error) {
            return Some(Err(fault));
        }
        let data = self.data?;
        Some(Ok(StreamEvent::Tick(Tick {
            symbol: data.symbol,
            bid: decimal(data.bid, "bid"),
            ask: decimal(data.ask, "ask"),
            last: decimal(data.last, "last"),
            volume: data.volume,
            time: timestamp(data.time),
        })))
    }
}

impl IntoStreamEvent for pb::OnTradeReply {
    fn into_stream_event(self) -> Option<Result<StreamEvent, TransportFault>> {
        if let Some(fault) = api_fault(self.error) {
            return Some(Err(fault));
        }
        let data = self.data?;
        Some(Ok(StreamEvent::Trade(TradeEvent {
            ticket: data.ticket,
            symbol: data.symbol,
            kind: trade_kind(data.kind),
            volume: decimal(data.volume, "volume"),
            price: decimal(data.price, "price"),
            profit: decimal(data.profit, "profit"),
            time: timestamp(data.time),
        })))
    }
}

impl IntoStreamEvent for pb::OnPositionProfitReply {
    fn into_stream_event(self) -> Option<Result<StreamEvent, TransportFault>> {
        if let Some(fault) = api_fault(self.error) {
            return Some(Err(fault));
        }
        let data = self.data?;
        Some(Ok(StreamEvent::PositionProfit(PositionProfitUpdate {
            positions: data
                .positions
                .into_iter()
                .map(|p| PositionProfit {
                    ticket: p.ticket,
                    symbol: p.symbol,
                    profit: decimal(p.profit, "profit"),
                })
                .collect(),
            time: timestamp(data.time),
        })))
    }
}

impl IntoStreamEvent for pb::OnTicketsReply {
    fn into_stream_event(self) -> Option<Result<StreamEvent, TransportFault>> {
        if let Some(fault) = api_fault(self.error) {
            return Some(Err(fault));
        }
        let data = self.data?;
        Some(Ok(StreamEvent::TicketList(TicketListSnapshot {
            position_tickets: data.position_tickets,
            pending_order_tickets: data.pending_order_tickets,
            time: timestamp(data.time),
        })))
    }
}

fn api_fault(error: Option<pb::ApiError>) -> Option<TransportFault> {
    let error = error?;
    if error.error_code.is_empty() && error.error_message.is_empty() {
        return None;
    }
    let code = if error.error_code.is_empty() {
        UNSPECIFIED_ERROR_CODE.to_string()
    } else {
        error.error_code
    };
    Some(TransportFault::api(code, error.error_message))
}

/// `value` as a decimal; NaN and infinities become zero with a warning.
fn decimal(value: f64, field: &'static str) -> Decimal {
    Decimal::try_from(value).unwrap_or_else(|e| {
        warn!(field, value, error = %e, "Unrepresentable number in reply, using zero");
        Decimal::ZERO
    })
}

/// Terminal time, or receipt time when the terminal omitted it.
fn timestamp(time: Option<prost_types::Timestamp>) -> DateTime<Utc> {
    time.and_then(|t| DateTime::from_timestamp(t.seconds, u32::try_from(t.nanos).ok()?))
        .unwrap_or_else(Utc::now)
}

fn trade_kind(kind: i32) -> TradeEventKind {
    match pb::TradeEventKind::try_from(kind) {
        Ok(pb::TradeEventKind::PositionOpened) => TradeEventKind::PositionOpened,
        Ok(pb::TradeEventKind::PositionModified) => TradeEventKind::PositionModified,
        Ok(pb::TradeEventKind::PositionClosed) => TradeEventKind::PositionClosed,
        Ok(pb::TradeEventKind::OrderPlaced) => TradeEventKind::OrderPlaced,
        Ok(pb::TradeEventKind::OrderRemoved) => TradeEventKind::OrderRemoved,
        Ok(pb::TradeEventKind::Unspecified) | Err(_) => TradeEventKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal_macros::dec;
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    use super::*;

    fn ts(seconds: i64) -> Option<prost_types::Timestamp> {
        Some(prost_types::Timestamp { seconds, nanos: 0 })
    }

    #[test]
    fn tick_reply_becomes_tick() {
        let reply = pb::OnTickReply {
            data: Some(pb::TickData {
                symbol: "XAUUSD".to_string(),
                bid: 2650.25,
                ask: 2650.75,
                last: 2650.5,
                volume: 4,
                time: ts(1_700_000_000),
            }),
            error: None,
        };

        let Some(Ok(StreamEvent::Tick(tick))) = reply.into_stream_event() else {
            panic!("expected a tick");
        };
        assert_eq!(tick.symbol, "XAUUSD");
        assert_eq!(tick.bid, dec!(2650.25));
        assert_eq!(tick.spread(), dec!(0.5));
        assert_eq!(tick.time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn in_band_error_wins_over_data() {
        let reply = pb::OnTickReply {
            data: Some(pb::TickData::default()),
            error: Some(pb::ApiError {
                error_code: "INSTANCE_NOT_FOUND".to_string(),
                error_message: "terminal restarted".to_string(),
            }),
        };
        assert_eq!(
            reply.into_stream_event(),
            Some(Err(TransportFault::api("INSTANCE_NOT_FOUND", "terminal restarted")))
        );
    }

    #[test]
    fn empty_reply_is_skipped() {
        assert_eq!(pb::OnTradeReply::default().into_stream_event(), None);

        let blank_error = pb::OnTicketsReply {
            data: None,
            error: Some(pb::ApiError::default()),
        };
        assert_eq!(blank_error.into_stream_event(), None);
    }

    #[test]
    fn error_without_code_gets_placeholder() {
        let reply = pb::OnPositionProfitReply {
            data: None,
            error: Some(pb::ApiError {
                error_code: String::new(),
                error_message: "boom".to_string(),
            }),
        };
        assert_eq!(
            reply.into_stream_event(),
            Some(Err(TransportFault::api("UNSPECIFIED", "boom")))
        );
    }

    #[test]
    fn trade_kind_mapping() {
        assert_eq!(
            trade_kind(pb::TradeEventKind::PositionClosed as i32),
            TradeEventKind::PositionClosed
        );
        assert_eq!(trade_kind(0), TradeEventKind::Unknown);
        assert_eq!(trade_kind(99), TradeEventKind::Unknown);
    }

    #[test]
    fn profit_reply_keeps_every_position() {
        let reply = pb::OnPositionProfitReply {
            data: Some(pb::PositionProfitData {
                positions: vec![
                    pb::PositionProfit {
                        ticket: 11,
                        symbol: "EURUSD".to_string(),
                        profit: 12.5,
                    },
                    pb::PositionProfit {
                        ticket: 12,
                        symbol: "GBPUSD".to_string(),
                        profit: -2.25,
                    },
                ],
                time: ts(1_700_000_100),
            }),
            error: None,
        };

        let Some(Ok(StreamEvent::PositionProfit(update))) = reply.into_stream_event() else {
            panic!("expected a profit update");
        };
        assert_eq!(update.positions.len(), 2);
        assert_eq!(update.total_profit(), dec!(10.25));
    }

    /// Counts warning events.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn non_finite_price_becomes_zero_with_a_warning() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(decimal(f64::NAN, "bid"), Decimal::ZERO);
            assert_eq!(decimal(f64::INFINITY, "ask"), Decimal::ZERO);
            assert_eq!(decimal(1.5, "last"), dec!(1.5));
        });

        assert_eq!(warnings.load(Ordering::SeqCst), 2);
    }
}
