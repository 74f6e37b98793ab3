//! Exchange adapter contract (C7): the uniform interface every venue
//! module implements, as a single trait rather than a class hierarchy
//! per venue.

pub mod hyperliquid;
pub mod mock;

use crate::model::{CexOrderDetails, Side};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Result of a synchronous adapter call (`place_order`, `cancel_order`,
/// `modify_order`, `query_order`). Mirrors the (status, reason_code,
/// reason_text) triple rather than a `Result<_, CoreError>` because a
/// venue rejection is routine business, not a programming error — the
/// lifecycle processor decides how to report it, not the adapter.
#[derive(Debug, Clone)]
pub struct OrderResponse {
    pub success: bool,
    pub exchange_order_id: Option<String>,
    pub reason_code: crate::model::ReasonCode,
    pub reason_text: String,
}

impl OrderResponse {
    pub fn ok(exchange_order_id: Option<String>) -> Self {
        Self {
            success: true,
            exchange_order_id,
            reason_code: crate::model::ReasonCode::Ok,
            reason_text: String::new(),
        }
    }

    pub fn reject(reason_code: crate::model::ReasonCode, reason_text: impl Into<String>) -> Self {
        Self {
            success: false,
            exchange_order_id: None,
            reason_code,
            reason_text: reason_text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenOrderBrief {
    pub client_order_id: String,
    pub exchange_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub remaining_size: Decimal,
    pub price: Option<Decimal>,
}

/// Optional filter set for `list_open_orders`; all `None` means "all open
/// orders for this venue".
#[derive(Debug, Clone, Default)]
pub struct OpenOrderFilter {
    pub symbol: Option<String>,
}

/// Async order-state update delivered by the adapter's private channel.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub client_order_id: Option<String>,
    pub exchange_order_id: Option<String>,
    pub raw_status: String,
    pub raw_reason: Option<String>,
    pub ts_ns: u64,
}

/// Async fill event delivered by the adapter's private channel. Adapters
/// deduplicate by `exec_id` within their own boundary before this ever
/// reaches the lifecycle processor.
#[derive(Debug, Clone)]
pub struct FillData {
    pub client_order_id: Option<String>,
    pub exchange_order_id: String,
    pub exec_id: String,
    pub symbol_or_pair: String,
    pub price: Decimal,
    pub size: Decimal,
    pub fee_currency: String,
    pub fee_amount: Decimal,
    pub is_maker: bool,
    pub ts_ns: u64,
}

#[derive(Debug, Clone)]
pub struct AdapterError {
    pub reason_code: crate::model::ReasonCode,
    pub message: String,
}

pub type OrderUpdateCallback = Arc<dyn Fn(OrderUpdate) + Send + Sync>;
pub type FillCallback = Arc<dyn Fn(FillData) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(AdapterError) + Send + Sync>;

/// A place request is the `CexOrderDetails` carried by the originating
/// `ExecutionOrder`, paired with the `cl_id` the adapter must echo back
/// (directly or via its own cloid-mapping layer) on every callback.
#[derive(Debug, Clone)]
pub struct PlaceRequest {
    pub client_order_id: String,
    pub details: CexOrderDetails,
}

#[derive(Debug, Clone, Default)]
pub struct ModifyRequest {
    pub new_size: Option<Decimal>,
    pub new_price: Option<Decimal>,
}

/// Uniform venue contract. Implementors own their connection lifecycle
/// and I/O threads; callbacks registered via
/// `on_order_update`/`on_fill`/`on_error` are serialized per adapter —
/// the lifecycle processor relies on that serialization to keep
/// per-`cl_id` report ordering.
pub trait ExchangeAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn initialize(&self, api_key: &str, api_secret: &str, testnet: bool) -> bool;

    fn connect(&self) -> bool;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn place_order(&self, req: &PlaceRequest) -> OrderResponse;

    fn cancel_order(
        &self,
        client_order_id: &str,
        symbol: Option<&str>,
        exchange_order_id: Option<&str>,
    ) -> OrderResponse;

    fn modify_order(&self, client_order_id: &str, req: &ModifyRequest) -> OrderResponse;

    fn query_order(&self, client_order_id: &str) -> OrderResponse;

    fn list_open_orders(&self, filter: &OpenOrderFilter) -> Vec<OpenOrderBrief>;

    fn on_order_update(&self, callback: OrderUpdateCallback);

    fn on_fill(&self, callback: FillCallback);

    fn on_error(&self, callback: ErrorCallback);
}
