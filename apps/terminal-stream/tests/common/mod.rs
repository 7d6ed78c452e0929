//! Scripted terminal for integration tests.
//!
//! Every `open` call consumes the next [`Script`]; once the scripts run out
//! further sessions stay open and silent. Sessions are counted while open so
//! tests can assert that at most one exists per subscription.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use futures::stream;
use rust_decimal::Decimal;
use tokio::time::Instant;

use terminal_stream::{
    EventStream, ReconnectConfig, StreamEvent, StreamRequest, StreamTransport, Tick,
    TicketListSnapshot, TransportFault,
};

// =============================================================================
// Scripts
// =============================================================================

/// One step of a scripted session.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver an event.
    Event(StreamEvent),
    /// Wait before the next step.
    Sleep(Duration),
    /// Fail the call.
    Fault(TransportFault),
    /// Never produce anything again.
    Pending,
}

/// What one `open` call does.
#[derive(Debug, Clone)]
pub enum Script {
    /// The call is accepted and plays `steps`; the remote closes after the
    /// last one.
    Session(Vec<Step>),
    /// The call is refused.
    Refuse(TransportFault),
    /// The call is accepted after `delay`, then plays `steps`.
    SlowOpen { delay: Duration, steps: Vec<Step> },
    /// The call is accepted and yields `event` on every poll without waiting.
    Flood(StreamEvent),
}

impl Script {
    /// `count` ticks, one every `every`, then the remote closes.
    pub fn ticks(count: usize, every: Duration) -> Self {
        Self::Session(tick_steps(0, count, every))
    }

    /// `count` ticks, one every `every`, then silence.
    pub fn ticks_then_pending(count: usize, every: Duration) -> Self {
        let mut steps = tick_steps(0, count, every);
        steps.push(Step::Pending);
        Self::Session(steps)
    }

    /// `count` ticks numbered from `first`, then `fault`.
    pub fn ticks_then_fault(
        first: usize,
        count: usize,
        every: Duration,
        fault: TransportFault,
    ) -> Self {
        let mut steps = tick_steps(first, count, every);
        steps.push(Step::Fault(fault));
        Self::Session(steps)
    }
}

/// `count` ticks numbered from `first`, one every `every`.
pub fn tick_steps(first: usize, count: usize, every: Duration) -> Vec<Step> {
    (first..first + count)
        .flat_map(|n| [Step::Sleep(every), Step::Event(StreamEvent::Tick(tick(n)))])
        .collect()
}

/// A tick whose volume is its sequence number.
pub fn tick(n: usize) -> Tick {
    Tick {
        symbol: "EURUSD".to_string(),
        bid: Decimal::new(10_850, 4),
        ask: Decimal::new(10_852, 4),
        last: Decimal::new(10_851, 4),
        volume: u64::try_from(n).unwrap(),
        time: DateTime::default(),
    }
}

/// An empty ticket list snapshot.
pub fn ticket_list() -> StreamEvent {
    StreamEvent::TicketList(TicketListSnapshot {
        position_tickets: Vec::new(),
        pending_order_tickets: Vec::new(),
        time: DateTime::default(),
    })
}

/// Backoff of 100ms doubling up to 1s, no jitter.
pub fn fast_reconnect(max_attempts: u32) -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(1),
        multiplier: 2.0,
        jitter_factor: 0.0,
        max_attempts,
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Session bookkeeping shared with the test.
#[derive(Debug, Default)]
pub struct SessionStats {
    opens: AtomicUsize,
    accepted: AtomicUsize,
    releases: AtomicUsize,
    open_now: AtomicUsize,
    max_open: AtomicUsize,
    open_times: Mutex<Vec<Instant>>,
}

impl SessionStats {
    /// `open` calls, refused ones included.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Sessions the terminal accepted.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Accepted sessions since released.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Sessions open right now.
    pub fn open_now(&self) -> usize {
        self.open_now.load(Ordering::SeqCst)
    }

    /// Most sessions ever open at once.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    /// When each `open` call arrived.
    pub fn open_times(&self) -> Vec<Instant> {
        self.open_times.lock().unwrap().clone()
    }
}

/// Released when the session's event stream is dropped.
struct SessionGuard(Arc<SessionStats>);

impl SessionGuard {
    fn new(stats: &Arc<SessionStats>) -> Self {
        stats.accepted.fetch_add(1, Ordering::SeqCst);
        let now = stats.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_open.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(stats))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.open_now.fetch_sub(1, Ordering::SeqCst);
        self.0.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// A terminal that plays back scripts.
#[derive(Debug)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<StreamRequest>>,
    stats: Arc<SessionStats>,
}

impl ScriptedTransport {
    /// Transport answering `open` calls with `scripts` in order.
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            stats: Arc::new(SessionStats::default()),
        })
    }

    /// Shared session bookkeeping.
    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, TransportFault> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        self.stats.open_times.lock().unwrap().push(Instant::now());
        self.requests.lock().unwrap().push(request.clone());

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Session(vec![Step::Pending]));

        let steps = match script {
            Script::Refuse(fault) => return Err(fault),
            Script::Session(steps) => steps,
            Script::SlowOpen { delay, steps } => {
                tokio::time::sleep(delay).await;
                steps
            }
            Script::Flood(event) => {
                let guard = SessionGuard::new(&self.stats);
                let events = stream::unfold((event, guard), |(event, guard)| async move {
                    Some((Ok(event.clone()), (event, guard)))
                });
                return Ok(Box::pin(events));
            }
        };

        let guard = SessionGuard::new(&self.stats);
        let events = stream::unfold(
            (steps.into_iter(), guard),
            |(mut steps, guard)| async move {
                loop {
                    match steps.next()? {
                        Step::Event(event) => return Some((Ok(event), (steps, guard))),
                        Step::Fault(fault) => return Some((Err(fault), (steps, guard))),
                        Step::Sleep(delay) => tokio::time::sleep(delay).await,
                        Step::Pending => std::future::pending::<()>().await,
                    }
                }
            },
        );
        Ok(Box::pin(events))
    }
}
