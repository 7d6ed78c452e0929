//! Client Configuration Settings
//!
//! Configuration types for the terminal client, loaded from environment
//! variables. Parsing goes through a lookup function so it can be tested
//! without touching the process environment.

use std::time::Duration;

use crate::application::services::{ReconnectConfig, StreamBounds};
use crate::domain::streaming::StreamRequest;

/// Identifier of the terminal instance, sent with every call.
#[derive(Clone, PartialEq, Eq)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wrap an identifier.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InstanceId").field(&"[REDACTED]").finish()
    }
}

/// gRPC channel settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Terminal gRPC endpoint URL.
    pub endpoint: String,
    /// Use TLS with the platform's root certificates.
    pub use_tls: bool,
    /// Timeout for establishing the channel.
    pub connect_timeout: Duration,
    /// HTTP/2 keepalive ping interval.
    pub keepalive_interval: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:50051".to_string(),
            use_tls: false,
            connect_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(30),
        }
    }
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectSettings {
    /// Initial reconnection delay.
    pub delay_initial: Duration,
    /// Maximum reconnection delay.
    pub delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub delay_multiplier: f64,
    /// Jitter as a fraction of the delay.
    pub jitter: f64,
    /// Maximum consecutive reconnection attempts (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        let config = ReconnectConfig::default();
        Self {
            delay_initial: config.initial_delay,
            delay_max: config.max_delay,
            delay_multiplier: config.multiplier,
            jitter: config.jitter_factor,
            max_attempts: config.max_attempts,
        }
    }
}

impl ReconnectSettings {
    /// Backoff configuration for new subscriptions.
    #[must_use]
    pub const fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: self.delay_initial,
            max_delay: self.delay_max,
            multiplier: self.delay_multiplier,
            jitter_factor: self.jitter,
            max_attempts: self.max_attempts,
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Terminal instance identifier.
    pub instance_id: InstanceId,
    /// gRPC channel settings.
    pub connection: ConnectionSettings,
    /// Reconnect backoff settings.
    pub reconnect: ReconnectSettings,
}

impl ClientConfig {
    /// Configuration with default settings for `instance_id`.
    #[must_use]
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: InstanceId::new(instance_id.into()),
            connection: ConnectionSettings::default(),
            reconnect: ReconnectSettings::default(),
        }
    }

    /// Point at a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.connection.endpoint = endpoint.into();
        self
    }

    /// Enable or disable TLS.
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.connection.use_tls = use_tls;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or a
    /// backoff parameter is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Unparseable optional values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a backoff
    /// parameter is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let instance_id = required(&lookup, "TERMINAL_INSTANCE_ID")?;

        let defaults = ConnectionSettings::default();
        let connection = ConnectionSettings {
            endpoint: lookup("TERMINAL_GRPC_ENDPOINT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.endpoint),
            use_tls: parse_bool(&lookup, "TERMINAL_USE_TLS", defaults.use_tls),
            connect_timeout: parse_duration_secs(
                &lookup,
                "TERMINAL_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout,
            ),
            keepalive_interval: parse_duration_secs(
                &lookup,
                "TERMINAL_KEEPALIVE_INTERVAL_SECS",
                defaults.keepalive_interval,
            ),
        };

        let defaults = ReconnectSettings::default();
        let reconnect = ReconnectSettings {
            delay_initial: parse_duration_millis(
                &lookup,
                "TERMINAL_RECONNECT_DELAY_INITIAL_MS",
                defaults.delay_initial,
            ),
            delay_max: parse_duration_millis(
                &lookup,
                "TERMINAL_RECONNECT_DELAY_MAX_MS",
                defaults.delay_max,
            ),
            delay_multiplier: parse(
                &lookup,
                "TERMINAL_RECONNECT_DELAY_MULTIPLIER",
                defaults.delay_multiplier,
            ),
            jitter: parse(&lookup, "TERMINAL_RECONNECT_JITTER", defaults.jitter),
            max_attempts: parse(
                &lookup,
                "TERMINAL_MAX_RECONNECT_ATTEMPTS",
                defaults.max_attempts,
            ),
        };

        if !(reconnect.delay_multiplier.is_finite() && reconnect.delay_multiplier >= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "TERMINAL_RECONNECT_DELAY_MULTIPLIER".to_string(),
                reason: "must be at least 1.0".to_string(),
            });
        }
        if !(0.0..1.0).contains(&reconnect.jitter) {
            return Err(ConfigError::InvalidValue {
                key: "TERMINAL_RECONNECT_JITTER".to_string(),
                reason: "must be in [0.0, 1.0)".to_string(),
            });
        }

        Ok(Self {
            instance_id: InstanceId::new(instance_id),
            connection,
            reconnect,
        })
    }
}

/// Which feed the binary subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamKind {
    /// Price ticks.
    #[default]
    Ticks,
    /// Trade events.
    Trades,
    /// Position profit updates.
    Profits,
    /// Ticket-list snapshots.
    Tickets,
}

impl StreamKind {
    /// Parse a kind name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ticks" | "tick" => Some(Self::Ticks),
            "trades" | "trade" => Some(Self::Trades),
            "profits" | "profit" => Some(Self::Profits),
            "tickets" | "ticket" => Some(Self::Tickets),
            _ => None,
        }
    }
}

/// What the binary subscribes to and when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Feed to subscribe to.
    pub kind: StreamKind,
    /// Symbols for the tick feed.
    pub symbols: Vec<String>,
    /// Push interval for the periodic feeds.
    pub interval: Duration,
    /// Skip profit updates while no position is open.
    pub ignore_empty: bool,
    /// Event and duration limits.
    pub bounds: StreamBounds,
}

impl StreamSettings {
    /// Read `STREAM_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `STREAM_KIND` or a tick feed without
    /// symbols.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `STREAM_*` variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `STREAM_KIND` or a tick feed without
    /// symbols.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup("STREAM_KIND") {
            Some(raw) => StreamKind::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "STREAM_KIND".to_string(),
                reason: format!("unknown kind '{raw}', expected ticks|trades|profits|tickets"),
            })?,
            None => StreamKind::default(),
        };

        let symbols: Vec<String> = lookup("STREAM_SYMBOLS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
            .collect();
        if kind == StreamKind::Ticks && symbols.is_empty() {
            return Err(ConfigError::MissingEnvVar("STREAM_SYMBOLS".to_string()));
        }

        let bounds = StreamBounds {
            max_events: lookup("STREAM_MAX_EVENTS").and_then(|v| v.trim().parse().ok()),
            max_duration: lookup("STREAM_DURATION_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        };

        Ok(Self {
            kind,
            symbols,
            interval: parse_duration_millis(&lookup, "STREAM_INTERVAL_MS", Duration::from_secs(1)),
            ignore_empty: parse_bool(&lookup, "STREAM_IGNORE_EMPTY", true),
            bounds,
        })
    }

    /// The request these settings describe.
    #[must_use]
    pub fn request(&self) -> StreamRequest {
        match self.kind {
            StreamKind::Ticks => StreamRequest::Ticks {
                symbols: self.symbols.clone(),
            },
            StreamKind::Trades => StreamRequest::TradeEvents,
            StreamKind::Profits => StreamRequest::PositionProfits {
                interval: self.interval,
                ignore_empty: self.ignore_empty,
            },
            StreamKind::Tickets => StreamRequest::TicketLists {
                interval: self.interval,
            },
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value.trim().to_string())
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(default, |v| {
        matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

fn parse_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn instance_id_is_required() {
        let err = ClientConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "TERMINAL_INSTANCE_ID"));

        let err = ClientConfig::from_lookup(env(&[("TERMINAL_INSTANCE_ID", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(_)));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ClientConfig::from_lookup(env(&[("TERMINAL_INSTANCE_ID", "abc")])).unwrap();
        assert_eq!(config.instance_id.as_str(), "abc");
        assert_eq!(config.connection, ConnectionSettings::default());
        assert_eq!(config.reconnect, ReconnectSettings::default());
        assert_eq!(config.reconnect.reconnect_config(), ReconnectConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ClientConfig::from_lookup(env(&[
            ("TERMINAL_INSTANCE_ID", "abc"),
            ("TERMINAL_GRPC_ENDPOINT", "https://terminal.example:443"),
            ("TERMINAL_USE_TLS", "true"),
            ("TERMINAL_CONNECT_TIMEOUT_SECS", "3"),
            ("TERMINAL_RECONNECT_DELAY_INITIAL_MS", "250"),
            ("TERMINAL_RECONNECT_DELAY_MAX_MS", "5000"),
            ("TERMINAL_RECONNECT_DELAY_MULTIPLIER", "1.5"),
            ("TERMINAL_RECONNECT_JITTER", "0.1"),
            ("TERMINAL_MAX_RECONNECT_ATTEMPTS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.connection.endpoint, "https://terminal.example:443");
        assert!(config.connection.use_tls);
        assert_eq!(config.connection.connect_timeout, Duration::from_secs(3));
        let reconnect = config.reconnect.reconnect_config();
        assert_eq!(reconnect.initial_delay, Duration::from_millis(250));
        assert_eq!(reconnect.max_delay, Duration::from_secs(5));
        assert!((reconnect.multiplier - 1.5).abs() < f64::EPSILON);
        assert!((reconnect.jitter_factor - 0.1).abs() < f64::EPSILON);
        assert_eq!(reconnect.max_attempts, 0);
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(env(&[
            ("TERMINAL_INSTANCE_ID", "abc"),
            ("TERMINAL_CONNECT_TIMEOUT_SECS", "soon"),
            ("TERMINAL_MAX_RECONNECT_ATTEMPTS", "-1"),
        ]))
        .unwrap();
        assert_eq!(config.connection.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.reconnect.max_attempts, 10);
    }

    #[test]
    fn out_of_range_backoff_is_rejected() {
        let err = ClientConfig::from_lookup(env(&[
            ("TERMINAL_INSTANCE_ID", "abc"),
            ("TERMINAL_RECONNECT_JITTER", "1.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TERMINAL_RECONNECT_JITTER"));

        let err = ClientConfig::from_lookup(env(&[
            ("TERMINAL_INSTANCE_ID", "abc"),
            ("TERMINAL_RECONNECT_DELAY_MULTIPLIER", "0.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn instance_id_redacted_debug() {
        let config = ClientConfig::new("secret-instance");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-instance"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn stream_settings_for_ticks() {
        let settings = StreamSettings::from_lookup(env(&[
            ("STREAM_KIND", "ticks"),
            ("STREAM_SYMBOLS", "eurusd, xauusd,,"),
            ("STREAM_MAX_EVENTS", "20"),
            ("STREAM_DURATION_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(settings.request(), StreamRequest::ticks(["EURUSD", "XAUUSD"]));
        assert_eq!(settings.bounds.max_events, Some(20));
        assert_eq!(settings.bounds.max_duration, Some(Duration::from_secs(10)));
    }

    #[test]
    fn stream_settings_require_symbols_for_ticks() {
        let err = StreamSettings::from_lookup(env(&[("STREAM_KIND", "ticks")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn stream_settings_for_profits() {
        let settings = StreamSettings::from_lookup(env(&[
            ("STREAM_KIND", "PROFITS"),
            ("STREAM_INTERVAL_MS", "500"),
            ("STREAM_IGNORE_EMPTY", "false"),
        ]))
        .unwrap();

        assert_eq!(
            settings.request(),
            StreamRequest::PositionProfits {
                interval: Duration::from_millis(500),
                ignore_empty: false,
            }
        );
        assert!(settings.bounds.is_unbounded());
    }

    #[test]
    fn unknown_stream_kind_is_rejected() {
        let err = StreamSettings::from_lookup(env(&[("STREAM_KIND", "orders")])).unwrap_err();
        assert!(err.to_string().contains("STREAM_KIND"));
    }
}
