//! Subscription Handle
//!
//! [`Subscription`] turns a pull-based [`EventSource`] into a
//! [`futures::Stream`] typed to one event payload. Each poll drives exactly
//! one pull on the source; no background task is spawned.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::outcome::{StreamError, Termination};
use crate::domain::streaming::{
    ConnectionState, EventKind, PositionProfitUpdate, StreamEvent, TicketListSnapshot, Tick,
    TradeEvent,
};
use crate::infrastructure::metrics;

/// A pull-based source of events for one logical subscription.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event.
    ///
    /// # Errors
    ///
    /// Returns the [`Termination`] once the source is finished.
    async fn next_event(&mut self) -> Result<StreamEvent, Termination>;

    /// Kind of event this source produces.
    fn kind(&self) -> EventKind;

    /// Identifier used in log fields.
    fn subscription_id(&self) -> Uuid;

    /// Receiver for connection state changes.
    fn watch_state(&self) -> watch::Receiver<ConnectionState>;
}

/// Payload types a [`Subscription`] can be typed to.
pub trait FromStreamEvent: Sized + Send + 'static {
    /// Extract the payload, or `None` if `event` is of another kind.
    fn from_event(event: StreamEvent) -> Option<Self>;
}

impl FromStreamEvent for StreamEvent {
    fn from_event(event: StreamEvent) -> Option<Self> {
        Some(event)
    }
}

impl FromStreamEvent for Tick {
    fn from_event(event: StreamEvent) -> Option<Self> {
        match event {
            StreamEvent::Tick(tick) => Some(tick),
            _ => None,
        }
    }
}

impl FromStreamEvent for TradeEvent {
    fn from_event(event: StreamEvent) -> Option<Self> {
        match event {
            StreamEvent::Trade(trade) => Some(trade),
            _ => None,
        }
    }
}

impl FromStreamEvent for PositionProfitUpdate {
    fn from_event(event: StreamEvent) -> Option<Self> {
        match event {
            StreamEvent::PositionProfit(update) => Some(update),
            _ => None,
        }
    }
}

impl FromStreamEvent for TicketListSnapshot {
    fn from_event(event: StreamEvent) -> Option<Self> {
        match event {
            StreamEvent::TicketList(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

type BoxedSource = Box<dyn EventSource>;
type PendingPull =
    Pin<Box<dyn Future<Output = (BoxedSource, Result<StreamEvent, Termination>)> + Send>>;

enum Slot {
    Ready(BoxedSource),
    Pulling(PendingPull),
    Finished,
}

/// A lazy, single-pass feed of `T`.
///
/// Yields `Ok(T)` per event. The stream ends with `None` when cancelled or
/// when a bound is reached, and with one `Err` followed by `None` on a fatal
/// fault or exhausted retries. [`Subscription::termination`] tells the
/// outcomes apart once the stream has ended.
///
/// Not resumable: after termination, open a new subscription. Dropping the
/// subscription releases any open session.
pub struct Subscription<T> {
    slot: Slot,
    termination: Option<Termination>,
    state: watch::Receiver<ConnectionState>,
    kind: EventKind,
    subscription_id: Uuid,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("subscription_id", &self.subscription_id)
            .field("state", &*self.state.borrow())
            .field("termination", &self.termination)
            .finish_non_exhaustive()
    }
}

impl<T: FromStreamEvent> Subscription<T> {
    /// Wrap `source`.
    pub fn new<S: EventSource + 'static>(source: S) -> Self {
        let state = source.watch_state();
        let kind = source.kind();
        let subscription_id = source.subscription_id();
        Self {
            slot: Slot::Ready(Box::new(source)),
            termination: None,
            state,
            kind,
            subscription_id,
            _payload: PhantomData,
        }
    }
}

impl<T> Subscription<T> {
    /// How the subscription ended, once it has.
    #[must_use]
    pub const fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    /// Whether the subscription has ended.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Connection state transitions, starting with the current state.
    #[must_use]
    pub fn state_changes(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.state.clone())
    }

    /// Kind of event this subscription delivers.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Identifier used in log fields.
    #[must_use]
    pub const fn subscription_id(&self) -> Uuid {
        self.subscription_id
    }

    fn finish(&mut self, termination: Termination) -> Option<StreamError> {
        metrics::record_termination(self.kind, termination.as_str());
        info!(
            subscription_id = %self.subscription_id,
            kind = %self.kind,
            outcome = termination.as_str(),
            "Subscription finished: {termination}"
        );
        let error = termination.to_error();
        self.termination = Some(termination);
        error
    }
}

impl<T: FromStreamEvent> Stream for Subscription<T> {
    type Item = Result<T, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match std::mem::replace(&mut this.slot, Slot::Finished) {
                Slot::Finished => return Poll::Ready(None),
                Slot::Ready(mut source) => {
                    this.slot = Slot::Pulling(Box::pin(async move {
                        let next = source.next_event().await;
                        (source, next)
                    }));
                }
                Slot::Pulling(mut pull) => match pull.as_mut().poll(cx) {
                    Poll::Pending => {
                        this.slot = Slot::Pulling(pull);
                        return Poll::Pending;
                    }
                    Poll::Ready((source, Ok(event))) => {
                        this.slot = Slot::Ready(source);
                        let kind = event.kind();
                        if let Some(payload) = T::from_event(event) {
                            return Poll::Ready(Some(Ok(payload)));
                        }
                        warn!(
                            subscription_id = %this.subscription_id,
                            expected = %this.kind,
                            received = %kind,
                            "Dropping event of unexpected kind"
                        );
                    }
                    Poll::Ready((source, Err(termination))) => {
                        drop(source);
                        return Poll::Ready(this.finish(termination).map(Err));
                    }
                },
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if self.termination.is_none() {
            debug!(
                subscription_id = %self.subscription_id,
                kind = %self.kind,
                "Subscription dropped before termination"
            );
        }
    }
}
