//! Terminal gRPC Transport
//!
//! Opens one server-streaming call per [`StreamRequest`] on a shared,
//! lazily connected channel. The transport never retries; every failure is
//! handed back as a [`TransportFault`].

use async_trait::async_trait;
use futures::StreamExt;
use tonic::Request;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use super::convert::IntoStreamEvent;
use super::proto::terminal::v1::{
    OnPositionProfitRequest, OnTickRequest, OnTicketsRequest, OnTradeRequest,
    subscription_service_client::SubscriptionServiceClient,
};
use crate::application::ports::{EventStream, StreamTransport, TransportFault};
use crate::domain::streaming::StreamRequest;
use crate::infrastructure::config::ClientConfig;

/// Metadata header carrying the terminal instance identifier.
const INSTANCE_ID_HEADER: &str = "id";

/// Errors building the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Transport error from tonic.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message describing the configuration issue.
        message: String,
    },
}

/// [`StreamTransport`] over the terminal's `SubscriptionService`.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    client: SubscriptionServiceClient<Channel>,
    instance_id: MetadataValue<Ascii>,
    endpoint: String,
}

impl GrpcTransport {
    /// Build a transport whose channel connects on first use.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint, TLS settings or instance id are
    /// invalid.
    pub fn connect_lazy(config: &ClientConfig) -> Result<Self, TransportError> {
        let instance_id = config
            .instance_id
            .as_str()
            .parse::<MetadataValue<Ascii>>()
            .map_err(|e| TransportError::InvalidConfig {
                message: format!("instance id is not a valid header value: {e}"),
            })?;
        let endpoint = Self::create_endpoint(config)?;
        let channel = endpoint.connect_lazy();

        tracing::debug!(
            endpoint = %config.connection.endpoint,
            tls = config.connection.use_tls,
            "Created lazy connection to terminal"
        );

        Ok(Self {
            client: SubscriptionServiceClient::new(channel),
            instance_id,
            endpoint: config.connection.endpoint.clone(),
        })
    }

    /// Endpoint URL this transport talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn create_endpoint(config: &ClientConfig) -> Result<Endpoint, TransportError> {
        let settings = &config.connection;
        let mut endpoint = Channel::from_shared(settings.endpoint.clone())
            .map_err(|e| TransportError::InvalidConfig {
                message: format!("invalid endpoint: {e}"),
            })?
            .connect_timeout(settings.connect_timeout)
            .tcp_keepalive(Some(settings.keepalive_interval))
            .http2_keep_alive_interval(settings.keepalive_interval)
            .keep_alive_while_idle(true)
            .tcp_nodelay(true);

        if settings.use_tls {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }

        Ok(endpoint)
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request
            .metadata_mut()
            .insert(INSTANCE_ID_HEADER, self.instance_id.clone());
        request
    }
}

#[async_trait]
impl StreamTransport for GrpcTransport {
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, TransportFault> {
        let mut client = self.client.clone();
        let events = match request {
            StreamRequest::Ticks { symbols } => {
                let message = OnTickRequest {
                    symbols: symbols.clone(),
                };
                replies(client.on_tick(self.request(message)).await?.into_inner())
            }
            StreamRequest::TradeEvents => {
                replies(client.on_trade(self.request(OnTradeRequest {})).await?.into_inner())
            }
            StreamRequest::PositionProfits {
                interval,
                ignore_empty,
            } => {
                let message = OnPositionProfitRequest {
                    interval_ms: interval_ms(*interval),
                    ignore_empty: *ignore_empty,
                };
                replies(client.on_position_profit(self.request(message)).await?.into_inner())
            }
            StreamRequest::TicketLists { interval } => {
                let message = OnTicketsRequest {
                    interval_ms: interval_ms(*interval),
                };
                replies(
                    client
                        .on_positions_and_pending_orders_tickets(self.request(message))
                        .await?
                        .into_inner(),
                )
            }
        };
        Ok(events)
    }
}

/// Adapt a reply stream; empty replies are dropped.
fn replies<R>(streaming: tonic::Streaming<R>) -> EventStream
where
    R: IntoStreamEvent + Send + 'static,
{
    Box::pin(streaming.filter_map(|item| async move {
        match item {
            Ok(reply) => reply.into_stream_event(),
            Err(status) => Some(Err(TransportFault::from(status))),
        }
    }))
}

fn interval_ms(interval: std::time::Duration) -> i32 {
    i32::try_from(interval.as_millis()).unwrap_or(i32::MAX)
}
