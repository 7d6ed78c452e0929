//! gRPC Adapter (Driven Adapter)
//!
//! Tonic-based implementation of the `StreamTransport` port against the
//! terminal's `SubscriptionService`.

mod convert;
mod transport;

pub use convert::IntoStreamEvent;
pub use transport::{GrpcTransport, TransportError};

/// Checked-in generated protobuf code.
#[allow(
    dead_code,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod terminal {
        pub mod v1 {
            include!("../../../../../packages/schema-gen/rust/terminal/v1/terminal.v1.rs");
            include!("../../../../../packages/schema-gen/rust/terminal/v1/terminal.v1.tonic.rs");
        }
    }
}
