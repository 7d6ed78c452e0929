//! Application Services
//!
//! The subscription manager, leaves first:
//!
//! - `classifier`: transient/fatal policy for transport faults
//! - `backoff`: per-subscription retry state
//! - `session`: one physical streaming call
//! - `reconnect`: a self-healing sequence of sessions
//! - `bounded`: event-count and duration limits
//! - `subscription`: the caller-facing `Stream`
//! - `streams`: entry points per feed

pub mod backoff;
pub mod bounded;
pub mod classifier;
pub mod outcome;
pub mod reconnect;
pub mod session;
pub mod streams;
pub mod subscription;

pub use backoff::{ReconnectConfig, ReconnectPolicy};
pub use bounded::{BoundedConsumer, StreamBounds};
pub use classifier::{ErrorClassifier, FatalFault, FatalReason, Fault};
pub use outcome::{Bound, StreamError, Termination};
pub use reconnect::ReconnectingStreamSource;
pub use session::{SessionError, StreamSession};
pub use streams::TerminalStreams;
pub use subscription::{EventSource, FromStreamEvent, Subscription};
