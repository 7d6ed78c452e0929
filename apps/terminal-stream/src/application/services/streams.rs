//! Terminal Streams
//!
//! Entry points for callers: one function per feed, plus `*_bounded`
//! variants that stop after a number of events or an elapsed duration.
//! Every call builds an independent subscription with its own retry state;
//! nothing is opened until the returned [`Subscription`] is first polled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::backoff::ReconnectConfig;
use super::bounded::{BoundedConsumer, StreamBounds};
use super::classifier::ErrorClassifier;
use super::reconnect::ReconnectingStreamSource;
use super::subscription::{FromStreamEvent, Subscription};
use crate::application::ports::StreamTransport;
use crate::domain::streaming::{
    PositionProfitUpdate, StreamEvent, StreamRequest, TicketListSnapshot, Tick, TradeEvent,
};

/// Factory for reconnecting subscriptions against one terminal.
#[derive(Clone)]
pub struct TerminalStreams {
    transport: Arc<dyn StreamTransport>,
    reconnect: ReconnectConfig,
    classifier: ErrorClassifier,
}

impl std::fmt::Debug for TerminalStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalStreams")
            .field("reconnect", &self.reconnect)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl TerminalStreams {
    /// Streams over `transport` with the default backoff and classifier.
    #[must_use]
    pub fn new(transport: Arc<dyn StreamTransport>) -> Self {
        Self {
            transport,
            reconnect: ReconnectConfig::default(),
            classifier: ErrorClassifier::default(),
        }
    }

    /// Use a different backoff configuration.
    #[must_use]
    pub fn with_reconnect_config(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Use a different fault classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Backoff configuration applied to new subscriptions.
    #[must_use]
    pub const fn reconnect_config(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    // =========================================================================
    // Unbounded
    // =========================================================================

    /// Subscribe to any feed.
    #[must_use]
    pub fn subscribe(
        &self,
        request: StreamRequest,
        cancel: &CancellationToken,
    ) -> Subscription<StreamEvent> {
        self.open(request, None, cancel)
    }

    /// Price ticks for `symbols`.
    #[must_use]
    pub fn ticks<I, S>(&self, symbols: I, cancel: &CancellationToken) -> Subscription<Tick>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open(StreamRequest::ticks(symbols), None, cancel)
    }

    /// Trade events on the account.
    #[must_use]
    pub fn trade_events(&self, cancel: &CancellationToken) -> Subscription<TradeEvent> {
        self.open(StreamRequest::TradeEvents, None, cancel)
    }

    /// Floating profit of open positions, pushed every `interval`.
    #[must_use]
    pub fn position_profits(
        &self,
        interval: Duration,
        ignore_empty: bool,
        cancel: &CancellationToken,
    ) -> Subscription<PositionProfitUpdate> {
        let request = StreamRequest::PositionProfits {
            interval,
            ignore_empty,
        };
        self.open(request, None, cancel)
    }

    /// Open position and pending order tickets, pushed every `interval`.
    #[must_use]
    pub fn ticket_lists(
        &self,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Subscription<TicketListSnapshot> {
        self.open(StreamRequest::TicketLists { interval }, None, cancel)
    }

    // =========================================================================
    // Bounded
    // =========================================================================

    /// [`Self::subscribe`] with bounds.
    #[must_use]
    pub fn subscribe_bounded(
        &self,
        request: StreamRequest,
        bounds: StreamBounds,
        cancel: &CancellationToken,
    ) -> Subscription<StreamEvent> {
        self.open(request, Some(bounds), cancel)
    }

    /// [`Self::ticks`] with bounds.
    #[must_use]
    pub fn ticks_bounded<I, S>(
        &self,
        symbols: I,
        bounds: StreamBounds,
        cancel: &CancellationToken,
    ) -> Subscription<Tick>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open(StreamRequest::ticks(symbols), Some(bounds), cancel)
    }

    /// [`Self::trade_events`] with bounds.
    #[must_use]
    pub fn trade_events_bounded(
        &self,
        bounds: StreamBounds,
        cancel: &CancellationToken,
    ) -> Subscription<TradeEvent> {
        self.open(StreamRequest::TradeEvents, Some(bounds), cancel)
    }

    /// [`Self::position_profits`] with bounds.
    #[must_use]
    pub fn position_profits_bounded(
        &self,
        interval: Duration,
        ignore_empty: bool,
        bounds: StreamBounds,
        cancel: &CancellationToken,
    ) -> Subscription<PositionProfitUpdate> {
        let request = StreamRequest::PositionProfits {
            interval,
            ignore_empty,
        };
        self.open(request, Some(bounds), cancel)
    }

    /// [`Self::ticket_lists`] with bounds.
    #[must_use]
    pub fn ticket_lists_bounded(
        &self,
        interval: Duration,
        bounds: StreamBounds,
        cancel: &CancellationToken,
    ) -> Subscription<TicketListSnapshot> {
        self.open(StreamRequest::TicketLists { interval }, Some(bounds), cancel)
    }

    fn open<T: FromStreamEvent>(
        &self,
        request: StreamRequest,
        bounds: Option<StreamBounds>,
        cancel: &CancellationToken,
    ) -> Subscription<T> {
        let source = ReconnectingStreamSource::new(
            Arc::clone(&self.transport),
            request,
            cancel.child_token(),
            self.reconnect.clone(),
            self.classifier.clone(),
        );
        let subscription = match bounds {
            Some(bounds) => Subscription::new(BoundedConsumer::new(source, bounds, cancel.clone())),
            None => Subscription::new(source),
        };
        info!(
            subscription_id = %subscription.subscription_id(),
            kind = %subscription.kind(),
            max_events = bounds.and_then(|b| b.max_events),
            max_duration_ms = bounds
                .and_then(|b| b.max_duration)
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            "Subscription created"
        );
        subscription
    }
}
