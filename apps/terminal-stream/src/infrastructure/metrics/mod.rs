//! Prometheus Metrics Module
//!
//! Subscription health metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Events**: events delivered to callers, by kind
//! - **Sessions**: physical calls opened and currently open
//! - **Recovery**: reconnects, backoff delays and faults by class
//! - **Outcomes**: how subscriptions terminated
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder, so the
//! library can be used without exporting anything.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::streaming::EventKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and describe every metric.
///
/// Calling this more than once returns the handle installed first.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "terminal_stream_events_total",
        "Total events delivered to subscribers"
    );

    describe_counter!(
        "terminal_stream_sessions_opened_total",
        "Total physical streaming calls opened"
    );
    describe_gauge!(
        "terminal_stream_sessions_open",
        "Physical streaming calls currently open"
    );

    describe_counter!(
        "terminal_stream_reconnects_total",
        "Total reconnect attempts after a transient fault"
    );
    describe_counter!(
        "terminal_stream_faults_total",
        "Total transport faults by class"
    );
    describe_histogram!(
        "terminal_stream_backoff_seconds",
        "Backoff delay awaited before a reconnect"
    );

    describe_counter!(
        "terminal_stream_terminations_total",
        "Total subscriptions terminated by outcome"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record an event delivered to a subscriber.
pub fn record_event(kind: EventKind) {
    counter!("terminal_stream_events_total", "kind" => kind.as_str()).increment(1);
}

/// Record a physical call being opened.
pub fn record_session_opened(kind: EventKind) {
    counter!("terminal_stream_sessions_opened_total", "kind" => kind.as_str()).increment(1);
    gauge!("terminal_stream_sessions_open", "kind" => kind.as_str()).increment(1.0);
}

/// Record a physical call being released.
pub fn record_session_closed(kind: EventKind) {
    gauge!("terminal_stream_sessions_open", "kind" => kind.as_str()).decrement(1.0);
}

/// Record a classified transport fault.
pub fn record_fault(kind: EventKind, class: &'static str, fault: &'static str) {
    counter!(
        "terminal_stream_faults_total",
        "kind" => kind.as_str(),
        "class" => class,
        "fault" => fault
    )
    .increment(1);
}

/// Record a reconnect and the delay awaited before it.
pub fn record_reconnect(kind: EventKind, delay: Duration) {
    counter!("terminal_stream_reconnects_total", "kind" => kind.as_str()).increment(1);
    histogram!("terminal_stream_backoff_seconds", "kind" => kind.as_str())
        .record(delay.as_secs_f64());
}

/// Record how a subscription terminated.
pub fn record_termination(kind: EventKind, outcome: &'static str) {
    counter!(
        "terminal_stream_terminations_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
