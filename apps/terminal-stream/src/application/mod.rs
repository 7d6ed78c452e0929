//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the subscription manager and the port interface
//! through which it reaches the terminal.

/// Port interfaces for external systems (the terminal transport).
pub mod ports;

/// Subscription manager: sessions, reconnection, bounds.
pub mod services;
