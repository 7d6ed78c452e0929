//! Stream Session
//!
//! One physical streaming call. The call handle is owned by the session and
//! released when the session is dropped, on every exit path: end of stream,
//! fault, cancellation, or the consumer simply dropping the sequence.

use std::time::Instant;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{EventStream, StreamTransport, TransportFault};
use crate::domain::streaming::{EventKind, StreamEvent, StreamRequest};
use crate::infrastructure::metrics;

/// Why a session stopped producing events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The cancellation token fired.
    Cancelled,
    /// The transport reported a fault. Never retried here.
    Fault(TransportFault),
}

impl From<TransportFault> for SessionError {
    fn from(fault: TransportFault) -> Self {
        Self::Fault(fault)
    }
}

/// Exclusive owner of one open streaming call.
pub struct StreamSession {
    events: EventStream,
    cancel: CancellationToken,
    kind: EventKind,
    subscription_id: Uuid,
    delivered: u64,
    opened_at: Instant,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("kind", &self.kind)
            .field("subscription_id", &self.subscription_id)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Open a call for `request`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Cancelled`] if `cancel` fires first, otherwise the
    /// transport's fault.
    pub async fn open(
        transport: &dyn StreamTransport,
        request: &StreamRequest,
        cancel: &CancellationToken,
        subscription_id: Uuid,
    ) -> Result<Self, SessionError> {
        let events = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SessionError::Cancelled),
            opened = transport.open(request) => opened?,
        };

        let kind = request.event_kind();
        metrics::record_session_opened(kind);
        debug!(%subscription_id, kind = %kind, "Stream session opened");

        Ok(Self {
            events,
            cancel: cancel.clone(),
            kind,
            subscription_id,
            delivered: 0,
            opened_at: Instant::now(),
        })
    }

    /// Wait for the next event.
    ///
    /// Returns `Ok(None)` when the remote ended the call. Cancellation is
    /// checked before a ready event is handed out.
    ///
    /// # Errors
    ///
    /// [`SessionError::Cancelled`] if `cancel` fired, otherwise the fault
    /// reported by the transport.
    pub async fn next(&mut self) -> Result<Option<StreamEvent>, SessionError> {
        let item = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(SessionError::Cancelled),
            item = self.events.next() => item,
        };

        match item {
            Some(Ok(event)) => {
                self.delivered += 1;
                Ok(Some(event))
            }
            Some(Err(fault)) => Err(SessionError::Fault(fault)),
            None => Ok(None),
        }
    }

    /// Events received on this call so far.
    #[must_use]
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        metrics::record_session_closed(self.kind);
        debug!(
            subscription_id = %self.subscription_id,
            kind = %self.kind,
            delivered = self.delivered,
            lifetime_ms = u64::try_from(self.opened_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Stream session released"
        );
    }
}
