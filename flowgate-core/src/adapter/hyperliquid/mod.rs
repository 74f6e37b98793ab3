//! Reference exchange adapter (C8) for the venue's signed-action API.
//! Exercises the full [`super::ExchangeAdapter`] contract plus the
//! hardest engineering details of this venue: a nonce manager, an
//! asset-universe cache, a two-lane signed-action batcher, bidirectional
//! cloid↔cl_id mapping, and market-order price synthesis. Signing itself
//! is delegated to the external process bridged by [`crate::signer`];
//! this module never holds EIP-712 or other signing logic.
//!
//! `connect()` spawns a private background thread that opens the
//! venue's `userEvents` WebSocket channel, subscribes for this wallet,
//! and drives the registered `on_order_update`/`on_fill`/`on_error`
//! callbacks as fills arrive — reconnecting with exponential backoff on
//! drop. That socket is read-only: it feeds [`transport::WsHealth`] so
//! `is_stable()` can report true once the stream has proven itself, but
//! every signed action still goes out over REST. Posting signed actions
//! over the socket once it is stable remains out of scope here; REST is
//! the venue's unconditionally supported path for that.

mod assets;
mod batcher;
mod cloid;
mod nonce;
mod transport;
mod wire;

use super::{
    AdapterError, ErrorCallback, ExchangeAdapter, FillCallback, FillData, ModifyRequest,
    OpenOrderBrief, OpenOrderFilter, OrderResponse, OrderUpdate, OrderUpdateCallback, PlaceRequest,
};
use crate::config::{HttpTimeouts, SignerPaths};
use crate::error::{reason_text, CoreError, CoreResult};
use crate::model::{CexOrderDetails, OrderType as CoreOrderType, ReasonCode, Side, TimeInForce as CoreTif};
use crate::signer::Signer;
use assets::AssetResolver;
use batcher::{Lane, PlaceBatcher};
use cloid::{Cloid, CloidMap};
use futures_util::{SinkExt, StreamExt};
use nonce::NonceManager;
use parking_lot::Mutex as PLMutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use transport::{synthesize_market_price, RestSender, WsHealth};
use url::Url;
use wire::{OidOrCloid, OrderRequest, OrderTypePlacement, TimeInForce as WireTif, TpSl, UserEventFrame, WsFill};

const DEFAULT_BATCH_CADENCE: Duration = Duration::from_millis(100);
const DEFAULT_MAX_BATCH: usize = 20;
const DEFAULT_SLIPPAGE_BPS: u32 = 10;
const DEFAULT_DEADLINE: Duration = Duration::from_millis(2_500);
const WS_IDLE_WINDOW: Duration = Duration::from_secs(10);
const WS_RECONNECT_BASE_DELAY: Duration = Duration::from_millis(500);
const WS_RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);
const WS_READ_TIMEOUT: Duration = Duration::from_secs(15);

struct TrackedOrder {
    asset: u32,
    oid: Option<u64>,
    symbol: String,
    side: Side,
    is_buy: bool,
    reduce_only: bool,
    order_type: OrderTypePlacement,
    remaining_size: Decimal,
    price: Option<Decimal>,
}

pub struct HyperliquidAdapter {
    name: String,
    base_url: String,
    http: reqwest::blocking::Client,
    timeouts: HttpTimeouts,
    signer_paths: SignerPaths,
    nonce: Arc<NonceManager>,
    assets: AssetResolver,
    cloids: Arc<CloidMap>,
    ws_health: Arc<WsHealth>,
    connected: AtomicBool,
    wallet_address: PLMutex<String>,
    private_key: PLMutex<String>,
    is_mainnet: AtomicBool,
    sender: PLMutex<Option<Arc<RestSender>>>,
    batcher: PLMutex<Option<PlaceBatcher>>,
    orders: Arc<PLMutex<HashMap<String, TrackedOrder>>>,
    on_update: Arc<PLMutex<Option<OrderUpdateCallback>>>,
    on_fill: Arc<PLMutex<Option<FillCallback>>>,
    on_error: Arc<PLMutex<Option<ErrorCallback>>>,
    ws_stop: Arc<AtomicBool>,
    ws_thread: PLMutex<Option<thread::JoinHandle<()>>>,
}

impl HyperliquidAdapter {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, timeouts: HttpTimeouts, signer_paths: SignerPaths) -> Self {
        let base_url = base_url.into();
        Self {
            name: name.into(),
            http: reqwest::blocking::Client::new(),
            assets: AssetResolver::new(base_url.clone(), reqwest::blocking::Client::new()),
            base_url,
            timeouts,
            signer_paths,
            nonce: Arc::new(NonceManager::new()),
            cloids: Arc::new(CloidMap::new()),
            ws_health: Arc::new(WsHealth::new(WS_IDLE_WINDOW)),
            connected: AtomicBool::new(false),
            wallet_address: PLMutex::new(String::new()),
            private_key: PLMutex::new(String::new()),
            is_mainnet: AtomicBool::new(false),
            sender: PLMutex::new(None),
            batcher: PLMutex::new(None),
            orders: Arc::new(PLMutex::new(HashMap::new())),
            on_update: Arc::new(PLMutex::new(None)),
            on_fill: Arc::new(PLMutex::new(None)),
            on_error: Arc::new(PLMutex::new(None)),
            ws_stop: Arc::new(AtomicBool::new(false)),
            ws_thread: PLMutex::new(None),
        }
    }

    /// Derives the private `userEvents` WebSocket URL from the REST base
    /// URL (`https://...` -> `wss://.../ws`), since the venue hosts both
    /// on the same host.
    fn ws_url_for(base_url: &str) -> String {
        let without_scheme = base_url.strip_prefix("https://").or_else(|| base_url.strip_prefix("http://")).unwrap_or(base_url);
        format!("wss://{}/ws", without_scheme.trim_end_matches('/'))
    }

    fn sender(&self) -> CoreResult<Arc<RestSender>> {
        self.sender.lock().clone().ok_or(CoreError::NotConnected)
    }

    fn wire_tif(tif: &CoreTif) -> WireTif {
        match tif {
            CoreTif::GTC => WireTif::Gtc,
            CoreTif::IOC | CoreTif::FOK => WireTif::Ioc,
            CoreTif::PostOnly => WireTif::Alo,
            CoreTif::Other(_) => WireTif::Gtc,
        }
    }

    fn lane_for(tif: &CoreTif) -> Lane {
        match tif {
            CoreTif::PostOnly => Lane::Slow,
            _ => Lane::Fast,
        }
    }

    /// Venue order type + price for the request, synthesizing a limit
    /// price for `Market` orders from a freshly fetched top-of-book mid.
    fn placement_for(&self, details: &CexOrderDetails) -> CoreResult<(OrderTypePlacement, Decimal)> {
        match details.order_type {
            CoreOrderType::Limit => {
                let price = details.price.ok_or(CoreError::PriceRequired(CoreOrderType::Limit))?;
                Ok((OrderTypePlacement::Limit { tif: Self::wire_tif(&details.time_in_force) }, price))
            }
            CoreOrderType::Market => {
                let mid = self.fetch_mid(&details.symbol)?;
                let price = synthesize_market_price(mid, details.side, DEFAULT_SLIPPAGE_BPS);
                Ok((OrderTypePlacement::Limit { tif: WireTif::Ioc }, price))
            }
            CoreOrderType::Stop | CoreOrderType::StopLimit => {
                let trigger_px = details.stop_price.ok_or(CoreError::StopPriceRequired(details.order_type))?;
                let is_market = details.order_type == CoreOrderType::Stop;
                let price = if is_market { trigger_px } else { details.price.ok_or(CoreError::PriceRequired(details.order_type))? };
                Ok((OrderTypePlacement::Trigger { trigger_px, is_market, tpsl: TpSl::Sl }, price))
            }
        }
    }

    fn fetch_mid(&self, symbol: &str) -> CoreResult<Decimal> {
        #[derive(serde::Deserialize)]
        struct Book {
            levels: Vec<Vec<BookLevel>>,
        }
        #[derive(serde::Deserialize)]
        struct BookLevel {
            #[serde(with = "rust_decimal::serde::str")]
            px: Decimal,
        }
        let book: Book = self
            .http
            .post(format!("{}/info", self.base_url))
            .json(&serde_json::json!({"type": "l2Book", "coin": symbol}))
            .send()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?
            .json()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;
        let best_bid = book.levels.first().and_then(|l| l.first()).map(|l| l.px);
        let best_ask = book.levels.get(1).and_then(|l| l.first()).map(|l| l.px);
        match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Ok((bid + ask) / Decimal::from(2u32)),
            _ => Err(CoreError::UnresolvableSymbol(symbol.to_string())),
        }
    }

    fn place_order_inner(&self, req: &PlaceRequest) -> CoreResult<OrderResponse> {
        self.sender()?;
        let (asset, _is_spot, decimals) = self.assets.resolve_any(&req.details.symbol)?;
        let size = self.assets.quantize(req.details.size, decimals);
        let (order_type, price) = self.placement_for(&req.details)?;
        let cloid = Cloid::generate();
        self.cloids.insert(&req.client_order_id, cloid);

        let wire_order = OrderRequest {
            asset,
            is_buy: req.details.side == Side::Buy,
            limit_px: price,
            sz: size,
            reduce_only: req.details.reduce_only,
            order_type: order_type.clone(),
            cloid,
        };

        let batcher = self.batcher.lock();
        let batcher = batcher.as_ref().ok_or(CoreError::NotConnected)?;
        let lane = Self::lane_for(&req.details.time_in_force);
        let status = batcher.submit(wire_order, lane, self.timeouts.request.max(DEFAULT_DEADLINE))?;
        drop(batcher);

        if let Some(error) = status.error {
            self.cloids.remove_by_cl_id(&req.client_order_id);
            return Err(CoreError::VenueReject(error));
        }
        let oid = status.resting.map(|r| r.oid).or_else(|| status.filled.map(|f| f.oid));

        self.orders.lock().insert(
            req.client_order_id.clone(),
            TrackedOrder {
                asset,
                oid,
                symbol: req.details.symbol.clone(),
                side: req.details.side,
                is_buy: req.details.side == Side::Buy,
                reduce_only: req.details.reduce_only,
                order_type,
                remaining_size: size,
                price: Some(price),
            },
        );

        Ok(OrderResponse::ok(oid.map(|o| o.to_string())))
    }

    fn cancel_order_inner(&self, client_order_id: &str) -> CoreResult<Option<String>> {
        let sender = self.sender()?;
        let tracked = self.orders.lock().remove(client_order_id);
        match tracked {
            Some(order) => {
                match order.oid {
                    Some(oid) => sender.cancel(order.asset, oid)?,
                    None => {
                        let cloid = self.cloids.cloid_for(client_order_id).ok_or(CoreError::UnknownClientOrderId(client_order_id.to_string()))?;
                        sender.cancel_by_cloid(order.asset, cloid)?;
                    }
                }
                self.cloids.remove_by_cl_id(client_order_id);
                Ok(order.oid.map(|o| o.to_string()))
            }
            None => Ok(None),
        }
    }
}

impl ExchangeAdapter for HyperliquidAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self, api_key: &str, api_secret: &str, testnet: bool) -> bool {
        if !self.signer_paths.is_complete() {
            return false;
        }
        let (python, script) = match (&self.signer_paths.python, &self.signer_paths.script) {
            (Some(p), Some(s)) => (p.clone(), s.clone()),
            _ => return false,
        };
        let signer = match Signer::spawn(&python, &script) {
            Ok(signer) => Arc::new(signer),
            Err(_) => return false,
        };
        *self.wallet_address.lock() = api_key.to_string();
        *self.private_key.lock() = api_secret.to_string();
        self.is_mainnet.store(!testnet, Ordering::Release);

        let rest_sender = match RestSender::new(
            self.base_url.clone(),
            &self.timeouts,
            signer,
            api_key.to_string(),
            api_secret.to_string(),
            !testnet,
            Arc::clone(&self.nonce),
        ) {
            Ok(sender) => Arc::new(sender),
            Err(_) => return false,
        };
        *self.sender.lock() = Some(Arc::clone(&rest_sender));
        *self.batcher.lock() = Some(PlaceBatcher::start(DEFAULT_BATCH_CADENCE, DEFAULT_MAX_BATCH, rest_sender));
        true
    }

    fn connect(&self) -> bool {
        self.connected.store(true, Ordering::Release);
        if self.sender.lock().is_some() && self.ws_thread.lock().is_none() {
            let ws_url = Self::ws_url_for(&self.base_url);
            let wallet_address = self.wallet_address.lock().clone();
            let ws_health = Arc::clone(&self.ws_health);
            let stop = Arc::clone(&self.ws_stop);
            let cloids = Arc::clone(&self.cloids);
            let orders = Arc::clone(&self.orders);
            let on_update = Arc::clone(&self.on_update);
            let on_fill = Arc::clone(&self.on_fill);
            let on_error = Arc::clone(&self.on_error);
            stop.store(false, Ordering::Release);
            let handle = thread::spawn(move || {
                run_user_event_thread(ws_url, wallet_address, ws_health, stop, cloids, orders, on_update, on_fill, on_error);
            });
            *self.ws_thread.lock() = Some(handle);
        }
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        self.ws_stop.store(true, Ordering::Release);
        if let Some(handle) = self.ws_thread.lock().take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, venue = %self.name, "hyperliquid user-event thread panicked");
            }
        }
        self.ws_health.mark_disconnected();
        if let Some(mut batcher) = self.batcher.lock().take() {
            batcher.shutdown();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn place_order(&self, req: &PlaceRequest) -> OrderResponse {
        self.place_order_inner(req).unwrap_or_else(|e| OrderResponse::reject(e.reason_code(), reason_text(&e)))
    }

    fn cancel_order(&self, client_order_id: &str, _symbol: Option<&str>, _exchange_order_id: Option<&str>) -> OrderResponse {
        match self.cancel_order_inner(client_order_id) {
            Ok(exchange_order_id) => OrderResponse::ok(exchange_order_id),
            Err(e) => OrderResponse::reject(e.reason_code(), reason_text(&e)),
        }
    }

    fn modify_order(&self, client_order_id: &str, req: &ModifyRequest) -> OrderResponse {
        let sender = match self.sender() {
            Ok(s) => s,
            Err(e) => return OrderResponse::reject(e.reason_code(), reason_text(&e)),
        };
        let mut orders = self.orders.lock();
        let Some(order) = orders.get_mut(client_order_id) else {
            return OrderResponse::reject(ReasonCode::InvalidParams, "unknown cl_id");
        };
        if let Some(size) = req.new_size {
            order.remaining_size = size;
        }
        if let Some(price) = req.new_price {
            order.price = Some(price);
        }
        let Some(cloid) = self.cloids.cloid_for(client_order_id) else {
            return OrderResponse::reject(ReasonCode::InvalidParams, "unknown cl_id");
        };
        let new_order = OrderRequest {
            asset: order.asset,
            is_buy: order.is_buy,
            limit_px: order.price.unwrap_or_default(),
            sz: order.remaining_size,
            reduce_only: order.reduce_only,
            order_type: order.order_type.clone(),
            cloid,
        };
        let oid_or_cloid = match order.oid {
            Some(oid) => OidOrCloid::Oid(oid),
            None => OidOrCloid::Cloid(cloid),
        };
        match sender.modify(oid_or_cloid, new_order) {
            Ok(()) => OrderResponse::ok(order.oid.map(|o| o.to_string())),
            Err(e) => OrderResponse::reject(e.reason_code(), reason_text(&e)),
        }
    }

    fn query_order(&self, client_order_id: &str) -> OrderResponse {
        match self.orders.lock().get(client_order_id) {
            Some(order) => OrderResponse::ok(order.oid.map(|o| o.to_string())),
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
                exchange_order_id: o.oid.map(|oid| oid.to_string()),
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

/// Background-thread entry point for the private `userEvents` socket.
/// Hosts its own small current-thread Tokio runtime, entirely off
/// `T_ingress`/`T_publish`, and runs the reconnecting read loop until
/// `stop` is set by `disconnect()`.
fn run_user_event_thread(
    ws_url: String,
    wallet_address: String,
    ws_health: Arc<WsHealth>,
    stop: Arc<AtomicBool>,
    cloids: Arc<CloidMap>,
    orders: Arc<PLMutex<HashMap<String, TrackedOrder>>>,
    on_update: Arc<PLMutex<Option<OrderUpdateCallback>>>,
    on_fill: Arc<PLMutex<Option<FillCallback>>>,
    on_error: Arc<PLMutex<Option<ErrorCallback>>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to build hyperliquid user-event runtime");
            return;
        }
    };
    runtime.block_on(user_event_loop(ws_url, wallet_address, ws_health, stop, cloids, orders, on_update, on_fill, on_error));
}

/// Reconnect loop: keeps re-opening the socket with exponential backoff
/// until `stop` is set. A clean disconnect (venue-initiated close, our
/// own `stop`) resets the backoff; an error bumps it.
async fn user_event_loop(
    ws_url: String,
    wallet_address: String,
    ws_health: Arc<WsHealth>,
    stop: Arc<AtomicBool>,
    cloids: Arc<CloidMap>,
    orders: Arc<PLMutex<HashMap<String, TrackedOrder>>>,
    on_update: Arc<PLMutex<Option<OrderUpdateCallback>>>,
    on_fill: Arc<PLMutex<Option<FillCallback>>>,
    on_error: Arc<PLMutex<Option<ErrorCallback>>>,
) {
    let mut attempt: u32 = 0;
    while !stop.load(Ordering::Acquire) {
        let result = connect_and_stream(&ws_url, &wallet_address, &ws_health, &stop, &cloids, &orders, &on_update, &on_fill).await;
        ws_health.mark_disconnected();
        match result {
            Ok(()) => attempt = 0,
            Err(message) => {
                tracing::warn!(error = %message, attempt, "hyperliquid user-event stream disconnected");
                if let Some(cb) = on_error.lock().as_ref() {
                    cb(AdapterError { reason_code: ReasonCode::NetworkError, message });
                }
                attempt = attempt.saturating_add(1);
            }
        }
        if stop.load(Ordering::Acquire) {
            break;
        }
        let backoff = WS_RECONNECT_BASE_DELAY.saturating_mul(1u32 << attempt.min(6));
        tokio::time::sleep(backoff.min(WS_RECONNECT_MAX_DELAY)).await;
    }
}

/// One connection's worth of work: dial, subscribe, then read frames
/// until the socket closes, errors, or goes quiet past `WS_READ_TIMEOUT`.
async fn connect_and_stream(
    ws_url: &str,
    wallet_address: &str,
    ws_health: &Arc<WsHealth>,
    stop: &Arc<AtomicBool>,
    cloids: &Arc<CloidMap>,
    orders: &Arc<PLMutex<HashMap<String, TrackedOrder>>>,
    on_update: &Arc<PLMutex<Option<OrderUpdateCallback>>>,
    on_fill: &Arc<PLMutex<Option<FillCallback>>>,
) -> Result<(), String> {
    let url = Url::parse(ws_url).map_err(|e| format!("invalid ws url: {e}"))?;
    let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await.map_err(|e| format!("connect failed: {e}"))?;
    let (mut sender, mut receiver) = ws_stream.split();

    let subscribe = serde_json::json!({
        "method": "subscribe",
        "subscription": {"type": "userEvents", "user": wallet_address},
    });
    sender.send(WsMessage::Text(subscribe.to_string())).await.map_err(|e| format!("subscribe failed: {e}"))?;

    ws_health.mark_connected();
    tracing::info!(url = %ws_url, "hyperliquid user-event stream connected");

    while !stop.load(Ordering::Acquire) {
        let message = match tokio::time::timeout(WS_READ_TIMEOUT, receiver.next()).await {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => return Err(format!("stream error: {e}")),
            Ok(None) => return Err("stream closed by venue".to_string()),
            Err(_) => return Err("read timed out".to_string()),
        };

        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                ws_health.note_message();
                continue;
            }
            WsMessage::Close(_) => return Err("stream closed by venue".to_string()),
            _ => continue,
        };
        ws_health.note_message();

        let Ok(frame) = serde_json::from_str::<UserEventFrame>(&text) else {
            continue;
        };
        if frame.channel != "user" {
            continue;
        }
        for fill in frame.data.fills {
            apply_ws_fill(fill, cloids, orders, on_update, on_fill);
        }
    }
    Ok(())
}

/// Folds one inbound fill into the tracked-order table and fires the
/// registered callbacks: always `on_fill`, plus `on_update` with a
/// terminal `"filled"` status once `remaining_size` reaches zero (or
/// `"partially_filled"` otherwise) so the lifecycle processor's pruning
/// invariant holds for fills that complete an order asynchronously.
fn apply_ws_fill(
    fill: WsFill,
    cloids: &Arc<CloidMap>,
    orders: &Arc<PLMutex<HashMap<String, TrackedOrder>>>,
    on_update: &Arc<PLMutex<Option<OrderUpdateCallback>>>,
    on_fill: &Arc<PLMutex<Option<FillCallback>>>,
) {
    let client_order_id = fill.cloid.as_deref().and_then(|s| s.parse::<Cloid>().ok()).and_then(|cloid| cloids.cl_id_for(cloid));
    let ts_ns = fill.time.saturating_mul(1_000_000);

    if let Some(cb) = on_fill.lock().as_ref() {
        cb(FillData {
            client_order_id: client_order_id.clone(),
            exchange_order_id: fill.oid.to_string(),
            exec_id: fill.tid.to_string(),
            symbol_or_pair: fill.coin.clone(),
            price: fill.px,
            size: fill.sz,
            fee_currency: fill.fee_token.clone(),
            fee_amount: fill.fee,
            is_maker: !fill.crossed,
            ts_ns,
        });
    }

    let Some(cl_id) = client_order_id else {
        return;
    };
    let mut orders_guard = orders.lock();
    let Some(tracked) = orders_guard.get_mut(&cl_id) else {
        return;
    };
    tracked.remaining_size = (tracked.remaining_size - fill.sz).max(Decimal::ZERO);
    let is_closed = tracked.remaining_size <= Decimal::ZERO;
    let exchange_order_id = tracked.oid.map(|o| o.to_string());
    if is_closed {
        orders_guard.remove(&cl_id);
    }
    drop(orders_guard);

    if let Some(cb) = on_update.lock().as_ref() {
        cb(OrderUpdate {
            client_order_id: Some(cl_id),
            exchange_order_id,
            raw_status: if is_closed { "filled" } else { "partially_filled" }.to_string(),
            raw_reason: None,
            ts_ns,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tif_maps_postonly_to_alo_and_fok_to_ioc() {
        assert!(matches!(HyperliquidAdapter::wire_tif(&CoreTif::PostOnly), WireTif::Alo));
        assert!(matches!(HyperliquidAdapter::wire_tif(&CoreTif::FOK), WireTif::Ioc));
        assert!(matches!(HyperliquidAdapter::wire_tif(&CoreTif::GTC), WireTif::Gtc));
    }

    #[test]
    fn lane_selection_routes_postonly_to_slow_lane() {
        assert_eq!(HyperliquidAdapter::lane_for(&CoreTif::PostOnly), Lane::Slow);
        assert_eq!(HyperliquidAdapter::lane_for(&CoreTif::IOC), Lane::Fast);
    }

    #[test]
    fn ws_url_derives_wss_from_the_rest_base_url() {
        assert_eq!(HyperliquidAdapter::ws_url_for("https://api.hyperliquid.xyz"), "wss://api.hyperliquid.xyz/ws");
        assert_eq!(HyperliquidAdapter::ws_url_for("https://api.hyperliquid-testnet.xyz/"), "wss://api.hyperliquid-testnet.xyz/ws");
    }

    #[test]
    fn uninitialized_adapter_rejects_place_with_not_connected() {
        let adapter = HyperliquidAdapter::new("hyperliquid", "https://example.invalid", HttpTimeouts {
            connect: Duration::from_millis(100),
            request: Duration::from_millis(200),
        }, SignerPaths::default());
        let req = PlaceRequest {
            client_order_id: "A1".into(),
            details: CexOrderDetails {
                symbol: "BTC".into(),
                side: Side::Buy,
                order_type: CoreOrderType::Limit,
                time_in_force: CoreTif::GTC,
                size: Decimal::ONE,
                price: Some(Decimal::from(50_000)),
                stop_price: None,
                reduce_only: false,
                margin_mode: crate::model::MarginMode::None,
                params: Default::default(),
            },
        };
        let resp = adapter.place_order(&req);
        assert!(!resp.success);
        assert_eq!(resp.reason_code, ReasonCode::NetworkError);
    }

    #[test]
    fn initialize_without_signer_paths_fails_cleanly() {
        let adapter = HyperliquidAdapter::new("hyperliquid", "https://example.invalid", HttpTimeouts {
            connect: Duration::from_millis(100),
            request: Duration::from_millis(200),
        }, SignerPaths::default());
        assert!(!adapter.initialize("0xabc", "0xsecret", true));
    }
}
