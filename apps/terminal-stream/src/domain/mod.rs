//! Domain Layer - Core streaming types.
//!
//! Pure value types for the terminal's feeds with no transport
//! dependencies.

/// Requests, events and connection state.
pub mod streaming;
