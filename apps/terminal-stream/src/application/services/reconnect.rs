//! Reconnecting Stream Source
//!
//! Presents one continuous event sequence for a logical subscription while
//! replacing failed [`StreamSession`]s behind the caller's back.
//!
//! # State Machine
//!
//! ```text
//! Idle ──pull──▶ Connecting ──opened──▶ Streaming
//!                    ▲                     │ transient fault
//!                    │                     ▼
//!                    └──delay elapsed── Backoff
//!
//! fatal fault | retries exhausted | cancellation ──▶ Terminated
//! ```
//!
//! The failed session is released before the backoff delay starts, so at
//! most one session is open at any instant.
//!
//! # Gaps
//!
//! Events the terminal pushes between a failure and the first event of the
//! replacement session are lost. They are not buffered or replayed: each
//! session's output is contiguous, but consecutive sessions may leave a gap
//! in the timeline.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backoff::{ReconnectConfig, ReconnectPolicy};
use super::classifier::{ErrorClassifier, Fault};
use super::outcome::Termination;
use super::session::{SessionError, StreamSession};
use super::subscription::EventSource;
use crate::application::ports::{StreamTransport, TransportFault};
use crate::domain::streaming::{ConnectionState, EventKind, StreamEvent, StreamRequest};
use crate::infrastructure::metrics;

/// Unbounded, self-healing event source for one logical subscription.
pub struct ReconnectingStreamSource {
    transport: Arc<dyn StreamTransport>,
    request: StreamRequest,
    cancel: CancellationToken,
    policy: ReconnectPolicy,
    classifier: ErrorClassifier,
    state: watch::Sender<ConnectionState>,
    session: Option<StreamSession>,
    subscription_id: Uuid,
    terminated: Option<Termination>,
}

impl std::fmt::Debug for ReconnectingStreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingStreamSource")
            .field("request", &self.request)
            .field("subscription_id", &self.subscription_id)
            .field("state", &*self.state.borrow())
            .field("attempt", &self.policy.attempt_count())
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl ReconnectingStreamSource {
    /// Create an idle source. Nothing is opened until the first pull.
    #[must_use]
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        request: StreamRequest,
        cancel: CancellationToken,
        config: ReconnectConfig,
        classifier: ErrorClassifier,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            transport,
            request,
            cancel,
            policy: ReconnectPolicy::new(config),
            classifier,
            state,
            session: None,
            subscription_id: Uuid::new_v4(),
            terminated: None,
        }
    }

    /// The request every session of this subscription sends.
    #[must_use]
    pub const fn request(&self) -> &StreamRequest {
        &self.request
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Consecutive failed attempts since the last delivered event.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.policy.attempt_count()
    }

    /// Whether a physical session is currently open.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Pull the next event, reconnecting as needed.
    ///
    /// # Errors
    ///
    /// Returns the [`Termination`] once the source is finished. Every later
    /// call returns the same termination without touching the transport.
    pub async fn next_event(&mut self) -> Result<StreamEvent, Termination> {
        if let Some(termination) = &self.terminated {
            return Err(termination.clone());
        }

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.terminate(Termination::Cancelled));
            }

            let fault = if let Some(session) = self.session.as_mut() {
                match session.next().await {
                    Ok(Some(event)) => {
                        self.policy.reset();
                        metrics::record_event(event.kind());
                        return Ok(event);
                    }
                    Ok(None) => TransportFault::Closed,
                    Err(SessionError::Cancelled) => {
                        return Err(self.terminate(Termination::Cancelled));
                    }
                    Err(SessionError::Fault(fault)) => fault,
                }
            } else {
                self.set_state(ConnectionState::Connecting);
                match StreamSession::open(
                    self.transport.as_ref(),
                    &self.request,
                    &self.cancel,
                    self.subscription_id,
                )
                .await
                {
                    Ok(session) => {
                        self.session = Some(session);
                        self.set_state(ConnectionState::Streaming);
                        continue;
                    }
                    Err(SessionError::Cancelled) => {
                        return Err(self.terminate(Termination::Cancelled));
                    }
                    Err(SessionError::Fault(fault)) => fault,
                }
            };

            self.session = None;
            self.recover(fault).await?;
        }
    }

    /// Classify `fault` and either wait out a backoff delay or terminate.
    async fn recover(&mut self, fault: TransportFault) -> Result<(), Termination> {
        let kind = self.kind();
        let classified = self.classifier.classify(&fault);
        let class = classified.class();
        let fault = match classified {
            Fault::Fatal(fatal) => {
                metrics::record_fault(kind, class, fatal.fault.label());
                error!(
                    subscription_id = %self.subscription_id,
                    reason = %fatal.reason,
                    fault = %fatal.fault,
                    "Fatal stream fault, not retrying"
                );
                return Err(self.terminate(Termination::Fatal(fatal)));
            }
            Fault::Transient(fault) => fault,
        };
        metrics::record_fault(kind, class, fault.label());

        let Some(delay) = self.policy.next_delay() else {
            let attempts = self.policy.attempt_count();
            error!(
                subscription_id = %self.subscription_id,
                attempts,
                fault = %fault,
                "Reconnect attempts exhausted"
            );
            return Err(self.terminate(Termination::RetriesExhausted {
                attempts,
                last_fault: fault,
            }));
        };

        self.set_state(ConnectionState::Backoff);
        metrics::record_reconnect(kind, delay);
        warn!(
            subscription_id = %self.subscription_id,
            attempt = self.policy.attempt_count(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            fault = %fault,
            "Stream interrupted, reconnecting after backoff"
        );

        let cancel = self.cancel.clone();
        let cancelled = tokio::select! {
            biased;
            () = cancel.cancelled() => true,
            () = tokio::time::sleep(delay) => false,
        };
        if cancelled {
            return Err(self.terminate(Termination::Cancelled));
        }
        Ok(())
    }

    fn terminate(&mut self, termination: Termination) -> Termination {
        self.session = None;
        self.set_state(ConnectionState::Terminated);
        info!(
            subscription_id = %self.subscription_id,
            outcome = termination.as_str(),
            "Stream source terminated"
        );
        self.terminated = Some(termination.clone());
        termination
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            debug!(subscription_id = %self.subscription_id, state = %next, "Connection state changed");
        }
    }
}

#[async_trait]
impl EventSource for ReconnectingStreamSource {
    async fn next_event(&mut self) -> Result<StreamEvent, Termination> {
        Self::next_event(self).await
    }

    fn kind(&self) -> EventKind {
        self.request.event_kind()
    }

    fn subscription_id(&self) -> Uuid {
        self.subscription_id
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Drop for ReconnectingStreamSource {
    fn drop(&mut self) {
        self.session = None;
        self.set_state(ConnectionState::Terminated);
    }
}
