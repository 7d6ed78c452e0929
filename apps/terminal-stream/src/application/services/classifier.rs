//! Fault Classification
//!
//! Maps a raw [`TransportFault`] to a [`Fault`]: either transient (worth a
//! fresh session) or fatal (permanent for the current request).
//!
//! # Default Policy
//!
//! | Fault | Class |
//! |-------|-------|
//! | `UNAVAILABLE`, `UNKNOWN`, `INTERNAL`, `ABORTED`, `CANCELLED`, `DEADLINE_EXCEEDED`, `RESOURCE_EXHAUSTED` | Transient |
//! | `NOT_FOUND` mentioning "instance not found" (terminal restarted) | Transient |
//! | any other gRPC status | Fatal |
//! | terminal error `INSTANCE_NOT_FOUND`, `TERMINAL_DISCONNECTED`, `TIMEOUT` | Transient |
//! | any other terminal error | Fatal |
//! | channel could not be established | Transient |
//! | remote ended the call | Transient |
//!
//! The remote ending the call counts as transient because every feed is
//! logically infinite: a closed call means the terminal went away, not that
//! the subscription is done.

use std::fmt;

use tonic::Code;

use crate::application::ports::TransportFault;

/// gRPC codes treated as transient by default.
pub const DEFAULT_TRANSIENT_CODES: [Code; 7] = [
    Code::Unavailable,
    Code::Unknown,
    Code::Internal,
    Code::Aborted,
    Code::Cancelled,
    Code::DeadlineExceeded,
    Code::ResourceExhausted,
];

/// Terminal error codes treated as transient by default.
pub const DEFAULT_TRANSIENT_API_CODES: [&str; 3] =
    ["INSTANCE_NOT_FOUND", "TERMINAL_DISCONNECTED", "TIMEOUT"];

/// Marker in a `NOT_FOUND` status meaning the terminal process restarted.
const INSTANCE_NOT_FOUND_HINT: &str = "instance not found";

/// Why a fault is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FatalReason {
    /// The request itself is malformed.
    InvalidRequest,
    /// The credentials lack access to this feed.
    PermissionDenied,
    /// The call was not authenticated.
    Unauthenticated,
    /// The terminal does not support this operation.
    Unsupported,
    /// The terminal rejected the subscription for another reason.
    Rejected,
}

impl FatalReason {
    /// Stable name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::PermissionDenied => "permission_denied",
            Self::Unauthenticated => "unauthenticated",
            Self::Unsupported => "unsupported",
            Self::Rejected => "rejected",
        }
    }

    const fn from_code(code: Code) -> Self {
        match code {
            Code::InvalidArgument | Code::OutOfRange => Self::InvalidRequest,
            Code::PermissionDenied => Self::PermissionDenied,
            Code::Unauthenticated => Self::Unauthenticated,
            Code::Unimplemented => Self::Unsupported,
            _ => Self::Rejected,
        }
    }
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fault that must not be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {fault}")]
pub struct FatalFault {
    /// Why the fault is permanent.
    pub reason: FatalReason,
    /// The underlying transport fault.
    pub fault: TransportFault,
}

/// Classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Recoverable by opening a fresh session, subject to the retry ceiling.
    Transient(TransportFault),
    /// Permanent for the current request; never retried.
    Fatal(FatalFault),
}

impl Fault {
    /// Whether this fault may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Fatal(_) => "fatal",
        }
    }
}

/// Deterministic transient/fatal policy.
///
/// Pure: classification performs no I/O and depends only on the fault and
/// the configured code lists.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    transient_codes: Vec<Code>,
    transient_api_codes: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            transient_codes: DEFAULT_TRANSIENT_CODES.to_vec(),
            transient_api_codes: DEFAULT_TRANSIENT_API_CODES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl ErrorClassifier {
    /// Classifier with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat terminal error `code` as transient.
    #[must_use]
    pub fn with_transient_api_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        if !self.transient_api_codes.contains(&code) {
            self.transient_api_codes.push(code);
        }
        self
    }

    /// Classify a transport fault.
    #[must_use]
    pub fn classify(&self, fault: &TransportFault) -> Fault {
        let reason = match fault {
            TransportFault::Connect(_) | TransportFault::Closed => None,
            TransportFault::Status { code, message } => {
                if self.transient_codes.contains(code)
                    || (*code == Code::NotFound && mentions_instance_not_found(message))
                {
                    None
                } else {
                    Some(FatalReason::from_code(*code))
                }
            }
            TransportFault::Api { code, .. } => {
                if self
                    .transient_api_codes
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(code))
                {
                    None
                } else {
                    Some(FatalReason::Rejected)
                }
            }
        };

        match reason {
            None => Fault::Transient(fault.clone()),
            Some(reason) => Fault::Fatal(FatalFault {
                reason,
                fault: fault.clone(),
            }),
        }
    }
}

fn mentions_instance_not_found(message: &str) -> bool {
    message.to_ascii_lowercase().contains(INSTANCE_NOT_FOUND_HINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Code::Unavailable ; "unavailable")]
    #[test_case(Code::Unknown ; "unknown")]
    #[test_case(Code::Internal ; "internal")]
    #[test_case(Code::Aborted ; "aborted")]
    #[test_case(Code::Cancelled ; "cancelled")]
    #[test_case(Code::DeadlineExceeded ; "deadline exceeded")]
    #[test_case(Code::ResourceExhausted ; "resource exhausted")]
    fn transient_status_codes(code: Code) {
        let fault = TransportFault::status(code, "connection reset by peer");
        assert_eq!(
            ErrorClassifier::new().classify(&fault),
            Fault::Transient(fault)
        );
    }

    #[test_case(Code::InvalidArgument, FatalReason::InvalidRequest ; "invalid argument")]
    #[test_case(Code::OutOfRange, FatalReason::InvalidRequest ; "out of range")]
    #[test_case(Code::PermissionDenied, FatalReason::PermissionDenied ; "permission denied")]
    #[test_case(Code::Unauthenticated, FatalReason::Unauthenticated ; "unauthenticated")]
    #[test_case(Code::Unimplemented, FatalReason::Unsupported ; "unimplemented")]
    #[test_case(Code::FailedPrecondition, FatalReason::Rejected ; "failed precondition")]
    #[test_case(Code::NotFound, FatalReason::Rejected ; "plain not found")]
    fn fatal_status_codes(code: Code, reason: FatalReason) {
        let fault = TransportFault::status(code, "rejected");
        assert_eq!(
            ErrorClassifier::new().classify(&fault),
            Fault::Fatal(FatalFault { reason, fault })
        );
    }

    #[test]
    fn restarted_instance_is_transient() {
        let fault = TransportFault::status(Code::NotFound, "Instance Not Found: 7f3a");
        let classified = ErrorClassifier::new().classify(&fault);
        assert!(classified.is_transient());
        assert_eq!(classified.class(), "transient");

        let fault = TransportFault::api("INSTANCE_NOT_FOUND", "terminal restarted");
        assert!(ErrorClassifier::new().classify(&fault).is_transient());
    }

    #[test]
    fn unknown_api_code_is_fatal() {
        let fault = TransportFault::api("INVALID_SYMBOL", "no such symbol XYZ");
        let classified = ErrorClassifier::new().classify(&fault);
        assert_eq!(classified.class(), "fatal");
        assert_eq!(
            classified,
            Fault::Fatal(FatalFault {
                reason: FatalReason::Rejected,
                fault,
            })
        );
    }

    #[test]
    fn api_codes_match_case_insensitively() {
        let fault = TransportFault::api("timeout", "terminal busy");
        assert!(ErrorClassifier::new().classify(&fault).is_transient());
    }

    #[test]
    fn extra_transient_api_code() {
        let fault = TransportFault::api("MARKET_CLOSED", "weekend");
        assert!(!ErrorClassifier::new().classify(&fault).is_transient());

        let classifier = ErrorClassifier::new().with_transient_api_code("MARKET_CLOSED");
        assert!(classifier.classify(&fault).is_transient());
    }

    #[test]
    fn connect_and_closed_are_transient() {
        let classifier = ErrorClassifier::new();
        assert!(
            classifier
                .classify(&TransportFault::Connect("refused".to_string()))
                .is_transient()
        );
        assert!(classifier.classify(&TransportFault::Closed).is_transient());
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = ErrorClassifier::new();
        let fault = TransportFault::status(Code::PermissionDenied, "no access");
        assert_eq!(classifier.classify(&fault), classifier.classify(&fault));
    }
}
