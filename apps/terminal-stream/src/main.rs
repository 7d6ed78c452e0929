//! Terminal Stream Binary
//!
//! Subscribes to one terminal feed and prints every event as a JSON line on
//! stdout until a bound is reached, the feed fails, or the process is
//! interrupted.
//!
//! # Usage
//!
//! ```bash
//! TERMINAL_INSTANCE_ID=... STREAM_SYMBOLS=EURUSD cargo run --bin terminal-stream
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `TERMINAL_INSTANCE_ID`: terminal instance identifier
//! - `STREAM_SYMBOLS`: comma separated symbols (tick feed only)
//!
//! ## Optional
//! - `TERMINAL_GRPC_ENDPOINT`: gRPC endpoint (default: <http://127.0.0.1:50051>)
//! - `TERMINAL_USE_TLS`: connect over TLS (default: false)
//! - `TERMINAL_CONNECT_TIMEOUT_SECS`: connect timeout (default: 10)
//! - `TERMINAL_KEEPALIVE_INTERVAL_SECS`: HTTP/2 keepalive (default: 30)
//! - `TERMINAL_RECONNECT_*`, `TERMINAL_MAX_RECONNECT_ATTEMPTS`: backoff tuning
//! - `STREAM_KIND`: ticks | trades | profits | tickets (default: ticks)
//! - `STREAM_INTERVAL_MS`: push interval for profits/tickets (default: 1000)
//! - `STREAM_IGNORE_EMPTY`: skip empty profit updates (default: true)
//! - `STREAM_MAX_EVENTS`: stop after this many events
//! - `STREAM_DURATION_SECS`: stop after this long
//! - `OTEL_ENABLED`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`
//! - `RUST_LOG`: Log level (default: info)

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use terminal_stream::infrastructure::telemetry;
use terminal_stream::{
    ClientConfig, GrpcTransport, StreamSettings, Subscription, TerminalStreams, init_metrics,
};
use terminal_stream::{StreamEvent, Termination};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!("Starting terminal stream");

    let _metrics_handle = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    };

    let config = ClientConfig::from_env().context("invalid terminal configuration")?;
    let settings = StreamSettings::from_env().context("invalid stream configuration")?;
    log_config(&config, &settings);

    let transport = GrpcTransport::connect_lazy(&config)?;
    let streams = TerminalStreams::new(Arc::new(transport))
        .with_reconnect_config(config.reconnect.reconnect_config());

    let shutdown_token = CancellationToken::new();
    tokio::spawn(await_shutdown(shutdown_token.clone()));

    let request = settings.request();
    let subscription = if settings.bounds.is_unbounded() {
        streams.subscribe(request, &shutdown_token)
    } else {
        streams.subscribe_bounded(request, settings.bounds, &shutdown_token)
    };

    let mut state_changes = subscription.state_changes();
    let subscription_id = subscription.subscription_id();
    tokio::spawn(async move {
        while let Some(state) = state_changes.next().await {
            tracing::info!(%subscription_id, %state, "Connection state changed");
        }
    });

    let exit = consume(subscription).await?;
    tracing::info!("Terminal stream stopped");
    Ok(exit)
}

/// Print events until the subscription ends and map its outcome to an exit
/// code.
async fn consume(mut subscription: Subscription<StreamEvent>) -> anyhow::Result<ExitCode> {
    let mut stdout = std::io::stdout();
    let mut delivered: u64 = 0;

    while let Some(item) = subscription.next().await {
        match item {
            Ok(event) => {
                delivered += 1;
                serde_json::to_writer(&mut stdout, &event)?;
                writeln!(stdout)?;
            }
            Err(e) => {
                tracing::error!(error = %e, "Subscription failed");
            }
        }
    }
    stdout.flush()?;

    let exit = match subscription.termination() {
        Some(Termination::Fatal(_) | Termination::RetriesExhausted { .. }) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    };
    tracing::info!(
        delivered,
        outcome = subscription.termination().map_or("unknown", Termination::as_str),
        "Subscription ended"
    );
    Ok(exit)
}

/// Log the parsed configuration.
fn log_config(config: &ClientConfig, settings: &StreamSettings) {
    tracing::info!(
        endpoint = %config.connection.endpoint,
        tls = config.connection.use_tls,
        kind = ?settings.kind,
        max_events = ?settings.bounds.max_events,
        max_duration = ?settings.bounds.max_duration,
        "Configuration loaded"
    );
    tracing::debug!(
        instance_id = ?config.instance_id,
        max_attempts = config.reconnect.max_attempts,
        "Reconnect settings"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT) and cancel the feed.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
}
