//! A minimal in-memory adapter implementing the full contract, used by
//! the lifecycle-processor and router tests and as a template for new
//! venue modules that don't need the Hyperliquid batcher's machinery.

use super::{
    AdapterError, ErrorCallback, ExchangeAdapter, FillCallback, ModifyRequest, OpenOrderBrief,
    OpenOrderFilter, OrderResponse, OrderUpdateCallback, PlaceRequest,
};
use crate::model::ReasonCode;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

struct MockOrder {
    exchange_order_id: String,
    symbol: String,
    side: crate::model::Side,
    remaining_size: rust_decimal::Decimal,
    price: Option<rust_decimal::Decimal>,
}

pub struct MockAdapter {
    name: String,
    connected: AtomicBool,
    next_exchange_id: AtomicU64,
    orders: Mutex<HashMap<String, MockOrder>>,
    /// cl_ids the test harness has pre-marked as "unknown at venue", so
    /// `cancel_order` exercises the idempotent-unknown path.
    unknown_at_venue: Mutex<std::collections::HashSet<String>>,
    on_update: Mutex<Option<OrderUpdateCallback>>,
    on_fill: Mutex<Option<FillCallback>>,
    on_error: Mutex<Option<ErrorCallback>>,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: AtomicBool::new(false),
            next_exchange_id: AtomicU64::new(1),
            orders: Mutex::new(HashMap::new()),
            unknown_at_venue: Mutex::new(std::collections::HashSet::new()),
            on_update: Mutex::new(None),
            on_fill: Mutex::new(None),
            on_error: Mutex::new(None),
        }
    }

    /// Test hook: make the next cancel of this `cl_id` behave as if the
    /// venue has no record of the order.
    pub fn mark_unknown_at_venue(&self, client_order_id: &str) {
        self.unknown_at_venue.lock().insert(client_order_id.to_string());
    }

    /// Test hook: deliver an async order update through the registered
    /// callback, as a real adapter's I/O thread would.
    pub fn emit_order_update(&self, update: super::OrderUpdate) {
        if let Some(cb) = self.on_update.lock().as_ref() {
            cb(update);
        }
    }

    pub fn emit_fill(&self, fill: super::FillData) {
        if let Some(cb) = self.on_fill.lock().as_ref() {
            cb(fill);
        }
    }
}

impl ExchangeAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self, _api_key: &str, _api_secret: &str, _testnet: bool) -> bool {
        true
    }

    fn connect(&self) -> bool {
        self.connected.store(true, Ordering::Release);
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn place_order(&self, req: &PlaceRequest) -> OrderResponse {
        let exchange_order_id = format!("mock-{}", self.next_exchange_id.fetch_add(1, Ordering::Relaxed));
        self.orders.lock().insert(
            req.client_order_id.clone(),
            MockOrder {
                exchange_order_id: exchange_order_id.clone(),
                symbol: req.details.symbol.clone(),
                side: req.details.side,
                remaining_size: req.details.size,
                price: req.details.price,
            },
        );
        OrderResponse::ok(Some(exchange_order_id))
    }

    fn cancel_order(
        &self,
        client_order_id: &str,
        _symbol: Option<&str>,
        _exchange_order_id: Option<&str>,
    ) -> OrderResponse {
        if self.unknown_at_venue.lock().remove(client_order_id) {
            return OrderResponse::ok(None);
        }
        match self.orders.lock().remove(client_order_id) {
            Some(order) => OrderResponse::ok(Some(order.exchange_order_id)),
            None => OrderResponse::ok(None),
        }
    }

    fn modify_order(&self, client_order_id: &str, req: &ModifyRequest) -> OrderResponse {
        let mut orders = self.orders.lock();
        match orders.get_mut(client_order_id) {
            Some(order) => {
                if let Some(size) = req.new_size {
                    order.remaining_size = size;
                }
                if let Some(price) = req.new_price {
                    order.price = Some(price);
                }
                OrderResponse::ok(Some(order.exchange_order_id.clone()))
            }
            None => OrderResponse::reject(ReasonCode::InvalidParams, "unknown cl_id"),
        }
    }

    fn query_order(&self, client_order_id: &str) -> OrderResponse {
        match self.orders.lock().get(client_order_id) {
            Some(order) => OrderResponse::ok(Some(order.exchange_order_id.clone())),
            None => OrderResponse::reject(ReasonCode::InvalidParams, "unknown cl_id"),
        }
    }

    fn list_open_orders(&self, filter: &OpenOrderFilter) -> Vec<OpenOrderBrief> {
        self.orders
            .lock()
            .iter()
            .filter(|(_, o)| filter.symbol.as_deref().map_or(true, |s| s == o.symbol))
            .map(|(cl_id, o)| OpenOrderBrief {
                client_order_id: cl_id.clone(),
                exchange_order_id: Some(o.exchange_order_id.clone()),
                symbol: o.symbol.clone(),
                side: o.side,
                remaining_size: o.remaining_size,
                price: o.price,
            })
            .collect()
    }

    fn on_order_update(&self, callback: OrderUpdateCallback) {
        *self.on_update.lock() = Some(callback);
    }

    fn on_fill(&self, callback: FillCallback) {
        *self.on_fill.lock() = Some(callback);
    }

    fn on_error(&self, callback: ErrorCallback) {
        *self.on_error.lock() = Some(callback);
    }
}

#[allow(dead_code)]
fn silence_unused_error_type(_e: AdapterError) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CexOrderDetails, MarginMode, OrderType, Side, TimeInForce};
    use rust_decimal_macros::dec;

    fn place_request(cl_id: &str) -> PlaceRequest {
        PlaceRequest {
            client_order_id: cl_id.to_string(),
            details: CexOrderDetails {
                symbol: "ETHUSDT".into(),
                side: Side::Buy,
                order_type: OrderType::Limit,
                time_in_force: TimeInForce::GTC,
                size: dec!(1.0),
                price: Some(dec!(2500)),
                stop_price: None,
                reduce_only: false,
                margin_mode: MarginMode::None,
                params: Default::default(),
            },
        }
    }

    #[test]
    fn place_then_cancel_round_trips() {
        let adapter = MockAdapter::new("mock");
        let resp = adapter.place_order(&place_request("A1"));
        assert!(resp.success);
        let cancel = adapter.cancel_order("A1", None, None);
        assert!(cancel.success);
    }

    #[test]
    fn cancel_unknown_at_venue_is_idempotent_success() {
        let adapter = MockAdapter::new("mock");
        adapter.mark_unknown_at_venue("A1");
        let cancel = adapter.cancel_order("A1", None, None);
        assert!(cancel.success);
        assert_eq!(cancel.exchange_order_id, None);
    }

    #[test]
    fn modify_unknown_order_is_rejected() {
        let adapter = MockAdapter::new("mock");
        let resp = adapter.modify_order("unknown", &ModifyRequest::default());
        assert!(!resp.success);
    }
}
