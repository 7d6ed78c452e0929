//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementation of the transport port
//! plus configuration and observability.

/// Configuration loading.
pub mod config;

/// gRPC transport adapter for the terminal.
pub mod grpc;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing integration.
pub mod telemetry;
