// @generated
// This file is @generated by prost-build.
/// Error reported in-band by the terminal.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ApiError {
    #[prost(string, tag = "1")]
    pub error_code: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub error_message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct OnTickRequest {
    #[prost(string, repeated, tag = "1")]
    pub symbols: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TickData {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(double, tag = "2")]
    pub bid: f64,
    #[prost(double, tag = "3")]
    pub ask: f64,
    #[prost(double, tag = "4")]
    pub last: f64,
    #[prost(uint64, tag = "5")]
    pub volume: u64,
    #[prost(message, optional, tag = "6")]
    pub time: ::core::option::Option<::prost_types::Timestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnTickReply {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<TickData>,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<ApiError>,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct OnTradeRequest {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TradeEventData {
    #[prost(uint64, tag = "1")]
    pub ticket: u64,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(enumeration = "TradeEventKind", tag = "3")]
    pub kind: i32,
    #[prost(double, tag = "4")]
    pub volume: f64,
    #[prost(double, tag = "5")]
    pub price: f64,
    #[prost(double, tag = "6")]
    pub profit: f64,
    #[prost(message, optional, tag = "7")]
    pub time: ::core::option::Option<::prost_types::Timestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnTradeReply {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<TradeEventData>,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<ApiError>,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct OnPositionProfitRequest {
    #[prost(int32, tag = "1")]
    pub interval_ms: i32,
    #[prost(bool, tag = "2")]
    pub ignore_empty: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PositionProfit {
    #[prost(uint64, tag = "1")]
    pub ticket: u64,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(double, tag = "3")]
    pub profit: f64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PositionProfitData {
    #[prost(message, repeated, tag = "1")]
    pub positions: ::prost::alloc::vec::Vec<PositionProfit>,
    #[prost(message, optional, tag = "2")]
    pub time: ::core::option::Option<::prost_types::Timestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnPositionProfitReply {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<PositionProfitData>,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<ApiError>,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct OnTicketsRequest {
    #[prost(int32, tag = "1")]
    pub interval_ms: i32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TicketsData {
    #[prost(uint64, repeated, tag = "1")]
    pub position_tickets: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, repeated, tag = "2")]
    pub pending_order_tickets: ::prost::alloc::vec::Vec<u64>,
    #[prost(message, optional, tag = "3")]
    pub time: ::core::option::Option<::prost_types::Timestamp>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnTicketsReply {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<TicketsData>,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<ApiError>,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TradeEventKind {
    Unspecified = 0,
    PositionOpened = 1,
    PositionModified = 2,
    PositionClosed = 3,
    OrderPlaced = 4,
    OrderRemoved = 5,
}
impl TradeEventKind {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "TRADE_EVENT_KIND_UNSPECIFIED",
            Self::PositionOpened => "TRADE_EVENT_KIND_POSITION_OPENED",
            Self::PositionModified => "TRADE_EVENT_KIND_POSITION_MODIFIED",
            Self::PositionClosed => "TRADE_EVENT_KIND_POSITION_CLOSED",
            Self::OrderPlaced => "TRADE_EVENT_KIND_ORDER_PLACED",
            Self::OrderRemoved => "TRADE_EVENT_KIND_ORDER_REMOVED",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "TRADE_EVENT_KIND_UNSPECIFIED" => Some(Self::Unspecified),
            "TRADE_EVENT_KIND_POSITION_OPENED" => Some(Self::PositionOpened),
            "TRADE_EVENT_KIND_POSITION_MODIFIED" => Some(Self::PositionModified),
            "TRADE_EVENT_KIND_POSITION_CLOSED" => Some(Self::PositionClosed),
            "TRADE_EVENT_KIND_ORDER_PLACED" => Some(Self::OrderPlaced),
            "TRADE_EVENT_KIND_ORDER_REMOVED" => Some(Self::OrderRemoved),
            _ => None,
        }
    }
}
