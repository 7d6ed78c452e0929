//! Terminal Streaming Types
//!
//! Core domain types for the terminal's server-push feeds: price ticks,
//! trade events, position profit updates and ticket-list snapshots.
//! These types are transport-agnostic and represent the canonical
//! internal representation of a feed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// What a logical subscription asks the terminal for.
///
/// A request is an immutable value: every session opened for a subscription
/// sends the same request, so it is cloned rather than mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamRequest {
    /// Price ticks for a set of symbols.
    Ticks {
        /// Symbols to subscribe to.
        symbols: Vec<String>,
    },
    /// Every trade event on the account.
    TradeEvents,
    /// Periodic floating profit of open positions.
    PositionProfits {
        /// How often the terminal pushes an update.
        interval: Duration,
        /// Skip updates while there are no open positions.
        ignore_empty: bool,
    },
    /// Periodic snapshot of open position and pending order tickets.
    TicketLists {
        /// How often the terminal pushes a snapshot.
        interval: Duration,
    },
}

impl StreamRequest {
    /// Tick request for the given symbols.
    pub fn ticks<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ticks {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// The kind of event this request produces.
    #[must_use]
    pub const fn event_kind(&self) -> EventKind {
        match self {
            Self::Ticks { .. } => EventKind::Tick,
            Self::TradeEvents => EventKind::Trade,
            Self::PositionProfits { .. } => EventKind::PositionProfit,
            Self::TicketLists { .. } => EventKind::TicketList,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Discriminant of a [`StreamEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Price tick.
    Tick,
    /// Trade event.
    Trade,
    /// Position profit update.
    PositionProfit,
    /// Ticket-list snapshot.
    TicketList,
}

impl EventKind {
    /// Stable name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Trade => "trade",
            Self::PositionProfit => "position_profit",
            Self::TicketList => "ticket_list",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Symbol name.
    pub symbol: String,
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Last deal price.
    pub last: Decimal,
    /// Volume of the last deal.
    pub volume: u64,
    /// Terminal time of the tick.
    pub time: DateTime<Utc>,
}

impl Tick {
    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// What happened in a [`TradeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeEventKind {
    /// A position was opened.
    PositionOpened,
    /// A position's stops or volume changed.
    PositionModified,
    /// A position was closed.
    PositionClosed,
    /// A pending order was placed.
    OrderPlaced,
    /// A pending order was removed or triggered.
    OrderRemoved,
    /// The terminal sent a kind this client does not know.
    Unknown,
}

/// A trade event on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Position or order ticket.
    pub ticket: u64,
    /// Symbol name.
    pub symbol: String,
    /// What happened.
    pub kind: TradeEventKind,
    /// Volume in lots.
    pub volume: Decimal,
    /// Price at which the event happened.
    pub price: Decimal,
    /// Realized or floating profit reported with the event.
    pub profit: Decimal,
    /// Terminal time of the event.
    pub time: DateTime<Utc>,
}

/// Floating profit of a single open position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionProfit {
    /// Position ticket.
    pub ticket: u64,
    /// Symbol name.
    pub symbol: String,
    /// Floating profit in account currency.
    pub profit: Decimal,
}

/// Periodic profit update for all open positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionProfitUpdate {
    /// One entry per open position.
    pub positions: Vec<PositionProfit>,
    /// Terminal time of the update.
    pub time: DateTime<Utc>,
}

impl PositionProfitUpdate {
    /// Sum of floating profit across positions.
    #[must_use]
    pub fn total_profit(&self) -> Decimal {
        self.positions.iter().map(|p| p.profit).sum()
    }
}

/// Snapshot of the tickets currently open on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketListSnapshot {
    /// Tickets of open positions.
    pub position_tickets: Vec<u64>,
    /// Tickets of pending orders.
    pub pending_order_tickets: Vec<u64>,
    /// Terminal time of the snapshot.
    pub time: DateTime<Utc>,
}

/// An event pushed by the terminal.
///
/// Events are plain values with no reference to the session that produced
/// them; consumers discriminate by variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Price tick.
    Tick(Tick),
    /// Trade event.
    Trade(TradeEvent),
    /// Position profit update.
    PositionProfit(PositionProfitUpdate),
    /// Ticket-list snapshot.
    TicketList(TicketListSnapshot),
}

impl StreamEvent {
    /// Discriminant of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Tick(_) => EventKind::Tick,
            Self::Trade(_) => EventKind::Trade,
            Self::PositionProfit(_) => EventKind::PositionProfit,
            Self::TicketList(_) => EventKind::TicketList,
        }
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of a logical subscription.
///
/// A session is open only while `Connecting` or `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Created, nothing pulled yet.
    #[default]
    Idle,
    /// Opening a session.
    Connecting,
    /// A session is open and delivering events.
    Streaming,
    /// Waiting before the next reconnect.
    Backoff,
    /// Finished; no session will be opened again.
    Terminated,
}

impl ConnectionState {
    /// Stable name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Backoff => "backoff",
            Self::Terminated => "terminated",
        }
    }

    /// Whether a physical session may be open in this state.
    #[must_use]
    pub const fn has_session(self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
