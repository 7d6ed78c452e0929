//! Bounded Consumer
//!
//! Adds an event-count bound and a wall-clock bound on top of an unbounded
//! [`EventSource`], alongside the caller's own cancellation token. The first
//! trigger to fire wins:
//!
//! | Trigger | Outcome |
//! |---------|---------|
//! | caller token cancelled | [`Termination::Cancelled`] |
//! | `max_events` delivered | [`Termination::BoundReached`] with [`Bound::EventCount`] |
//! | `max_duration` elapsed since the first pull | [`Termination::BoundReached`] with [`Bound::Duration`] |
//!
//! The inner source (and any session it holds) is dropped before the
//! terminating pull returns. With no bounds configured the consumer is a
//! pass-through.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::outcome::{Bound, Termination};
use super::subscription::EventSource;
use crate::domain::streaming::{ConnectionState, EventKind, StreamEvent};

/// Optional limits on a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamBounds {
    /// Stop after this many events.
    pub max_events: Option<u64>,
    /// Stop once this much time has passed since the first pull.
    pub max_duration: Option<Duration>,
}

impl StreamBounds {
    /// No limits.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_events: None,
            max_duration: None,
        }
    }

    /// Limit the number of events.
    #[must_use]
    pub const fn with_max_events(mut self, max_events: u64) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Limit the elapsed time.
    #[must_use]
    pub const fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    /// Whether neither limit is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_events.is_none() && self.max_duration.is_none()
    }
}

enum Step {
    Cancelled,
    Expired(Duration),
    Pulled(Result<StreamEvent, Termination>),
}

/// Truncates an inner source at the first of three triggers.
pub struct BoundedConsumer<S> {
    inner: Option<S>,
    bounds: StreamBounds,
    cancel: CancellationToken,
    delivered: u64,
    deadline: Option<Instant>,
    terminated: Option<Termination>,
    kind: EventKind,
    subscription_id: Uuid,
    state: watch::Receiver<ConnectionState>,
}

impl<S> std::fmt::Debug for BoundedConsumer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedConsumer")
            .field("bounds", &self.bounds)
            .field("delivered", &self.delivered)
            .field("inner_alive", &self.inner.is_some())
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl<S: EventSource> BoundedConsumer<S> {
    /// Bound `inner`. `cancel` is the caller's token; `inner` should observe
    /// the same token or a child of it.
    #[must_use]
    pub fn new(inner: S, bounds: StreamBounds, cancel: CancellationToken) -> Self {
        Self {
            kind: inner.kind(),
            subscription_id: inner.subscription_id(),
            state: inner.watch_state(),
            inner: Some(inner),
            bounds,
            cancel,
            delivered: 0,
            deadline: None,
            terminated: None,
        }
    }

    /// Events delivered so far.
    #[must_use]
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Whether the inner source is still held.
    #[must_use]
    pub const fn holds_inner(&self) -> bool {
        self.inner.is_some()
    }

    /// Pull the next event unless a trigger has fired.
    ///
    /// # Errors
    ///
    /// Returns the [`Termination`] once any trigger fires or the inner source
    /// terminates on its own.
    pub async fn next_event(&mut self) -> Result<StreamEvent, Termination> {
        if let Some(termination) = &self.terminated {
            return Err(termination.clone());
        }
        if let Some(max) = self.bounds.max_events
            && self.delivered >= max
        {
            return Err(self.finish(Termination::BoundReached(Bound::EventCount(max))));
        }
        if let Some(max) = self.bounds.max_duration
            && self.deadline.is_none()
        {
            self.deadline = Some(Instant::now() + max);
        }

        let max_duration = self.bounds.max_duration.unwrap_or_default();
        loop {
            // A source that is always ready never lets the deadline timer fire.
            if let Some(deadline) = self.deadline
                && Instant::now() >= deadline
            {
                return Err(self.finish(Termination::BoundReached(Bound::Duration(max_duration))));
            }

            let Some(inner) = self.inner.as_mut() else {
                return Err(self.finish(Termination::Cancelled));
            };

            let cancel = self.cancel.clone();
            let deadline = self.deadline;
            let step = tokio::select! {
                biased;
                () = cancel.cancelled() => Step::Cancelled,
                () = expire(deadline) => Step::Expired(max_duration),
                pulled = inner.next_event() => Step::Pulled(pulled),
            };

            match step {
                Step::Cancelled => return Err(self.finish(Termination::Cancelled)),
                Step::Expired(elapsed) => {
                    return Err(self.finish(Termination::BoundReached(Bound::Duration(elapsed))));
                }
                Step::Pulled(Err(termination)) => return Err(self.finish(termination)),
                Step::Pulled(Ok(event)) if event.kind() != self.kind => {
                    warn!(
                        subscription_id = %self.subscription_id,
                        expected = %self.kind,
                        received = %event.kind(),
                        "Skipping event of unexpected kind"
                    );
                }
                Step::Pulled(Ok(event)) => {
                    self.delivered += 1;
                    if self.bounds.max_events.is_some_and(|max| self.delivered >= max) {
                        self.inner = None;
                        debug!(
                            subscription_id = %self.subscription_id,
                            delivered = self.delivered,
                            "Event bound reached, inner source released"
                        );
                    }
                    return Ok(event);
                }
            }
        }
    }

    fn finish(&mut self, termination: Termination) -> Termination {
        self.inner = None;
        debug!(
            subscription_id = %self.subscription_id,
            delivered = self.delivered,
            outcome = termination.as_str(),
            "Bounded consumer finished"
        );
        self.terminated = Some(termination.clone());
        termination
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl<S: EventSource> EventSource for BoundedConsumer<S> {
    async fn next_event(&mut self) -> Result<StreamEvent, Termination> {
        Self::next_event(self).await
    }

    fn kind(&self) -> EventKind {
        self.kind
    }

    fn subscription_id(&self) -> Uuid {
        self.subscription_id
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::streaming::{Tick, TicketListSnapshot};

    /// Emits a tick every `every`, forever.
    struct Ticker {
        every: Duration,
        dropped: Arc<AtomicBool>,
        state: watch::Sender<ConnectionState>,
    }

    impl Ticker {
        fn new(every: Duration) -> (Self, Arc<AtomicBool>) {
            let dropped = Arc::new(AtomicBool::new(false));
            let ticker = Self {
                every,
                dropped: Arc::clone(&dropped),
                state: watch::channel(ConnectionState::Streaming).0,
            };
            (ticker, dropped)
        }
    }

    impl Drop for Ticker {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl EventSource for Ticker {
        async fn next_event(&mut self) -> Result<StreamEvent, Termination> {
            if !self.every.is_zero() {
                tokio::time::sleep(self.every).await;
            }
            Ok(StreamEvent::Tick(Tick {
                symbol: "XAUUSD".to_string(),
                bid: dec!(2650.10),
                ask: dec!(2650.40),
                last: dec!(2650.25),
                volume: 1,
                time: chrono::DateTime::default(),
            }))
        }

        fn kind(&self) -> EventKind {
            EventKind::Tick
        }

        fn subscription_id(&self) -> Uuid {
            Uuid::nil()
        }

        fn watch_state(&self) -> watch::Receiver<ConnectionState> {
            self.state.subscribe()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn count_bound_releases_inner_after_last_event() {
        let (ticker, dropped) = Ticker::new(Duration::from_millis(100));
        let bounds = StreamBounds::unbounded().with_max_events(3);
        let mut consumer = BoundedConsumer::new(ticker, bounds, CancellationToken::new());

        for _ in 0..3 {
            assert!(consumer.next_event().await.is_ok());
        }
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(
            consumer.next_event().await,
            Err(Termination::BoundReached(Bound::EventCount(3)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_events_never_pulls_inner() {
        let (ticker, dropped) = Ticker::new(Duration::from_millis(100));
        let bounds = StreamBounds::unbounded().with_max_events(0);
        let mut consumer = BoundedConsumer::new(ticker, bounds, CancellationToken::new());
        let started = Instant::now();

        assert_eq!(
            consumer.next_event().await,
            Err(Termination::BoundReached(Bound::EventCount(0)))
        );
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_bound_cuts_a_fast_source() {
        let (ticker, dropped) = Ticker::new(Duration::from_millis(30));
        let bounds = StreamBounds::unbounded().with_max_duration(Duration::from_millis(100));
        let mut consumer = BoundedConsumer::new(ticker, bounds, CancellationToken::new());
        let started = Instant::now();

        let mut delivered = 0;
        let termination = loop {
            match consumer.next_event().await {
                Ok(_) => delivered += 1,
                Err(termination) => break termination,
            }
        };

        assert_eq!(delivered, 3);
        assert_eq!(
            termination,
            Termination::BoundReached(Bound::Duration(Duration::from_millis(100)))
        );
        assert_eq!(started.elapsed(), Duration::from_millis(100));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn duration_bound_cuts_an_always_ready_source() {
        let (ticker, dropped) = Ticker::new(Duration::ZERO);
        let bounds = StreamBounds::unbounded().with_max_duration(Duration::from_millis(20));
        let mut consumer = BoundedConsumer::new(ticker, bounds, CancellationToken::new());
        let started = std::time::Instant::now();

        let termination = loop {
            match consumer.next_event().await {
                Ok(_) => assert!(
                    started.elapsed() < Duration::from_secs(2),
                    "duration bound never fired"
                ),
                Err(termination) => break termination,
            }
        };

        assert_eq!(
            termination,
            Termination::BoundReached(Bound::Duration(Duration::from_millis(20)))
        );
        assert!(dropped.load(Ordering::SeqCst));
    }

    /// Yields a ticket list before every tick.
    struct Mixed {
        ticker: Ticker,
        ticket_due: bool,
    }

    #[async_trait]
    impl EventSource for Mixed {
        async fn next_event(&mut self) -> Result<StreamEvent, Termination> {
            self.ticket_due = !self.ticket_due;
            if !self.ticket_due {
                return Ok(StreamEvent::TicketList(TicketListSnapshot {
                    position_tickets: vec![1],
                    pending_order_tickets: Vec::new(),
                    time: chrono::DateTime::default(),
                }));
            }
            self.ticker.next_event().await
        }

        fn kind(&self) -> EventKind {
            EventKind::Tick
        }

        fn subscription_id(&self) -> Uuid {
            Uuid::nil()
        }

        fn watch_state(&self) -> watch::Receiver<ConnectionState> {
            self.ticker.watch_state()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn events_of_another_kind_do_not_count() {
        let (ticker, dropped) = Ticker::new(Duration::from_millis(100));
        let mixed = Mixed {
            ticker,
            ticket_due: true,
        };
        let bounds = StreamBounds::unbounded().with_max_events(2);
        let mut consumer = BoundedConsumer::new(mixed, bounds, CancellationToken::new());

        for _ in 0..2 {
            let event = consumer.next_event().await.unwrap();
            assert_eq!(event.kind(), EventKind::Tick);
        }
        assert_eq!(consumer.delivered(), 2);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_wins_over_bounds() {
        let (ticker, dropped) = Ticker::new(Duration::from_millis(100));
        let cancel = CancellationToken::new();
        let bounds = StreamBounds::unbounded()
            .with_max_events(20)
            .with_max_duration(Duration::from_secs(10));
        let mut consumer = BoundedConsumer::new(ticker, bounds, cancel.clone());

        assert!(consumer.next_event().await.is_ok());
        cancel.cancel();

        assert_eq!(consumer.next_event().await, Err(Termination::Cancelled));
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(consumer.delivered(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_is_pass_through() {
        let (ticker, _dropped) = Ticker::new(Duration::from_secs(60));
        let mut consumer =
            BoundedConsumer::new(ticker, StreamBounds::default(), CancellationToken::new());

        for _ in 0..50 {
            assert!(consumer.next_event().await.is_ok());
        }
        assert!(consumer.holds_inner());
    }
}
