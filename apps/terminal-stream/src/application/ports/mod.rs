//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `StreamTransport`: opens one physical streaming call to the terminal
//!   and hands back its replies as a stream of events.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::streaming::{StreamEvent, StreamRequest};

/// Events of one physical streaming call.
///
/// Dropping the stream closes the call.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, TransportFault>> + Send>>;

/// A raw fault reported by the transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFault {
    /// The call failed with a gRPC status.
    #[error("grpc status {code:?}: {message}")]
    Status {
        /// gRPC status code.
        code: tonic::Code,
        /// Status message from the server or the local transport.
        message: String,
    },

    /// The terminal reported an error inside a reply message.
    #[error("terminal error {code}: {message}")]
    Api {
        /// Terminal error code (e.g. `INSTANCE_NOT_FOUND`).
        code: String,
        /// Human readable description.
        message: String,
    },

    /// The channel to the terminal could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The remote side ended the call.
    #[error("stream closed by remote")]
    Closed,
}

impl TransportFault {
    /// Build a status fault.
    pub fn status(code: tonic::Code, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Build an in-band terminal error.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Api { .. } => "api",
            Self::Connect(_) => "connect",
            Self::Closed => "closed",
        }
    }
}

impl From<tonic::Status> for TransportFault {
    fn from(status: tonic::Status) -> Self {
        Self::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

impl From<tonic::transport::Error> for TransportFault {
    fn from(error: tonic::transport::Error) -> Self {
        Self::Connect(error.to_string())
    }
}

/// Opens physical streaming calls to the terminal.
///
/// Implementations must not retry: a failed open or a failed stream is
/// reported as a [`TransportFault`] and recovery is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open one streaming call for `request`.
    ///
    /// # Errors
    ///
    /// Returns the fault that prevented the call from opening.
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, TransportFault>;
}
