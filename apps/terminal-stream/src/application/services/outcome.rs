//! Termination Outcomes
//!
//! Every subscription ends in exactly one [`Termination`]. Cancellation and
//! reached bounds are normal outcomes; only a fatal fault and exhausted
//! retries are errors and convert into [`StreamError`].

use std::fmt;
use std::time::Duration;

use super::classifier::FatalFault;
use crate::application::ports::TransportFault;

/// Which caller-configured limit stopped a bounded subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// The configured number of events was delivered.
    EventCount(u64),
    /// The configured wall-clock duration elapsed.
    Duration(Duration),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventCount(n) => write!(f, "{n} events"),
            Self::Duration(d) => write!(f, "{}ms elapsed", d.as_millis()),
        }
    }
}

/// Why a subscription stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The caller's cancellation token fired.
    Cancelled,
    /// A configured bound was reached.
    BoundReached(Bound),
    /// The terminal rejected the subscription permanently.
    Fatal(FatalFault),
    /// Transient faults kept recurring past the attempt ceiling.
    RetriesExhausted {
        /// Failed attempts made before giving up.
        attempts: u32,
        /// The fault that triggered the final give-up.
        last_fault: TransportFault,
    },
}

impl Termination {
    /// Whether this outcome is an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Fatal(_) | Self::RetriesExhausted { .. })
    }

    /// Stable name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::BoundReached(_) => "bound_reached",
            Self::Fatal(_) => "fatal",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// The error this outcome represents, if any.
    #[must_use]
    pub fn to_error(&self) -> Option<StreamError> {
        match self {
            Self::Cancelled | Self::BoundReached(_) => None,
            Self::Fatal(fault) => Some(StreamError::Fatal(fault.clone())),
            Self::RetriesExhausted {
                attempts,
                last_fault,
            } => Some(StreamError::RetriesExhausted {
                attempts: *attempts,
                last_fault: last_fault.clone(),
            }),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::BoundReached(bound) => write!(f, "bound reached ({bound})"),
            Self::Fatal(fault) => write!(f, "fatal: {fault}"),
            Self::RetriesExhausted { attempts, .. } => {
                write!(f, "gave up after {attempts} reconnect attempts")
            }
        }
    }
}

/// Error ending a subscription.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The terminal rejected the subscription permanently.
    #[error("subscription rejected: {0}")]
    Fatal(#[source] FatalFault),

    /// Transient faults kept recurring past the attempt ceiling.
    #[error("too many reconnects: gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Failed attempts made before giving up.
        attempts: u32,
        /// The fault that triggered the final give-up.
        #[source]
        last_fault: TransportFault,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::classifier::FatalReason;

    #[test]
    fn only_faults_are_errors() {
        assert!(!Termination::Cancelled.is_error());
        assert!(!Termination::BoundReached(Bound::EventCount(20)).is_error());
        assert_eq!(Termination::Cancelled.to_error(), None);

        let fatal = Termination::Fatal(FatalFault {
            reason: FatalReason::PermissionDenied,
            fault: TransportFault::status(tonic::Code::PermissionDenied, "denied"),
        });
        assert!(fatal.is_error());
        assert!(matches!(fatal.to_error(), Some(StreamError::Fatal(_))));
    }

    #[test]
    fn exhausted_retries_hide_the_raw_fault() {
        let outcome = Termination::RetriesExhausted {
            attempts: 10,
            last_fault: TransportFault::Closed,
        };
        let error = outcome.to_error().unwrap();
        assert_eq!(
            error.to_string(),
            "too many reconnects: gave up after 10 attempts"
        );
        assert_eq!(outcome.as_str(), "retries_exhausted");
    }

    #[test]
    fn bound_display() {
        assert_eq!(
            Termination::BoundReached(Bound::Duration(Duration::from_secs(2))).to_string(),
            "bound reached (2000ms elapsed)"
        );
    }
}
