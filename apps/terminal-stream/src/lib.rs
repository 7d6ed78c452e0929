#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Terminal Stream - Resilient Subscription Client
//!
//! Client side of a remote trading terminal's server-push subscriptions.
//! A caller asks for a feed once and consumes one continuous, lazy stream
//! of events; dropped connections are re-established behind it.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Requests, events and connection state
//!   - `streaming`: ticks, trade events, profit updates, ticket lists
//!
//! - **Application**: Subscription manager and port definitions
//!   - `ports`: the `StreamTransport` interface and raw faults
//!   - `services`: classification, backoff, sessions, reconnection, bounds
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `grpc`: tonic transport for the terminal's `SubscriptionService`
//!   - `config`: environment configuration
//!   - `metrics`: Prometheus instrumentation
//!   - `telemetry`: logging and OpenTelemetry tracing
//!
//! # Data Flow
//!
//! ```text
//!  Terminal ──► GrpcTransport ──► StreamSession ──► ReconnectingStreamSource
//!                   ▲                                        │
//!                   └──── reopen after backoff ◄─────────────┤
//!                                                            ▼
//!                         Subscription<T> ◄── BoundedConsumer (optional)
//! ```
//!
//! # Gaps and Cancellation
//!
//! Events produced by the terminal while no session is open are lost; a
//! resumed subscription continues with whatever the terminal pushes next.
//! Every subscription runs under a child of the caller's
//! [`CancellationToken`](tokio_util::sync::CancellationToken); cancelling
//! it, or dropping the subscription, releases the open session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core streaming types with no transport dependencies.
pub mod domain;

/// Application layer - Subscription manager and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::streaming::{
    ConnectionState, EventKind, PositionProfit, PositionProfitUpdate, StreamEvent, StreamRequest,
    TicketListSnapshot, Tick, TradeEvent, TradeEventKind,
};

// Ports
pub use application::ports::{EventStream, StreamTransport, TransportFault};

// Subscription manager
pub use application::services::{
    Bound, BoundedConsumer, ErrorClassifier, EventSource, FatalFault, FatalReason, Fault,
    FromStreamEvent, ReconnectConfig, ReconnectPolicy, ReconnectingStreamSource, StreamBounds,
    StreamError, StreamSession, Subscription, TerminalStreams, Termination,
};

// Infrastructure config
pub use infrastructure::config::{
    ClientConfig, ConfigError, ConnectionSettings, ReconnectSettings, StreamKind, StreamSettings,
};

// gRPC transport
pub use infrastructure::grpc::{GrpcTransport, TransportError, proto::terminal::v1 as proto};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
