//! Configuration Module
//!
//! Configuration loading for the terminal client and the stream binary.

mod settings;

pub use settings::{
    ClientConfig, ConfigError, ConnectionSettings, InstanceId, ReconnectSettings, StreamKind,
    StreamSettings,
};
