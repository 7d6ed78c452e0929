// @generated
/// Generated client implementations.
pub mod subscription_service_client {
    #![allow(
        unused_variables,
        dead_code,
        missing_docs,
        clippy::wildcard_imports,
        clippy::let_unit_value,
    )]
    use tonic::codegen::*;
    use tonic::codegen::http::Uri;
    /** SubscriptionService exposes the terminal's server-push feeds. Every call
 must carry the terminal instance identifier in the `id` metadata header.
*/
    #[derive(Debug, Clone)]
    pub struct SubscriptionServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl SubscriptionServiceClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> SubscriptionServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::Body>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }
        pub fn with_interceptor<F>(
            inner: T,
            interceptor: F,
        ) -> SubscriptionServiceClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T::ResponseBody: Default,
            T: tonic::codegen::Service<
                http::Request<tonic::body::Body>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::Body>>::ResponseBody,
                >,
            >,
            <T as tonic::codegen::Service<
                http::Request<tonic::body::Body>,
            >>::Error: Into<StdError> + std::marker::Send + std::marker::Sync,
        {
            SubscriptionServiceClient::new(InterceptedService::new(inner, interceptor))
        }
        /// Compress requests with the given encoding.
        ///
        /// This requires the server to support it otherwise it might respond with an
        /// error.
        #[must_use]
        pub fn send_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.send_compressed(encoding);
            self
        }
        /// Enable decompressing responses.
        #[must_use]
        pub fn accept_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.accept_compressed(encoding);
            self
        }
        /// Limits the maximum size of a decoded message.
        ///
        /// Default: `4MB`
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }
        /// Limits the maximum size of an encoded message.
        ///
        /// Default: `usize::MAX`
        #[must_use]
        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }
        /// Price ticks for the requested symbols.
        pub async fn on_tick(
            &mut self,
            request: impl tonic::IntoRequest<super::OnTickRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::OnTickReply>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/terminal.v1.SubscriptionService/OnTick",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("terminal.v1.SubscriptionService", "OnTick"));
            self.inner.server_streaming(req, path, codec).await
        }
        /// Trade events (positions opened/modified/closed, orders placed/removed).
        pub async fn on_trade(
            &mut self,
            request: impl tonic::IntoRequest<super::OnTradeRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::OnTradeReply>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/terminal.v1.SubscriptionService/OnTrade",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("terminal.v1.SubscriptionService", "OnTrade"));
            self.inner.server_streaming(req, path, codec).await
        }
        /// Periodic floating profit for every open position.
        pub async fn on_position_profit(
            &mut self,
            request: impl tonic::IntoRequest<super::OnPositionProfitRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::OnPositionProfitReply>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/terminal.v1.SubscriptionService/OnPositionProfit",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(
                    GrpcMethod::new(
                        "terminal.v1.SubscriptionService",
                        "OnPositionProfit",
                    ),
                );
            self.inner.server_streaming(req, path, codec).await
        }
        /// Periodic snapshot of open position and pending order tickets.
        pub async fn on_positions_and_pending_orders_tickets(
            &mut self,
            request: impl tonic::IntoRequest<super::OnTicketsRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::OnTicketsReply>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/terminal.v1.SubscriptionService/OnPositionsAndPendingOrdersTickets",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(
                    GrpcMethod::new(
                        "terminal.v1.SubscriptionService",
                        "OnPositionsAndPendingOrdersTickets",
                    ),
                );
            self.inner.server_streaming(req, path, codec).await
        }
    }
}
