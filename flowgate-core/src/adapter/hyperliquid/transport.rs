//! Dual REST/WebSocket transport and market-order price synthesis.
//! REST is the default path; the private WebSocket channel
//! (order-update stream) doubles as a signed-action post path once it
//! has been stable for longer than `ws_idle_window`. Both paths share
//! the same signed-envelope construction — only how the bytes leave the
//! process differs.

use super::batcher::BatchSender;
use super::wire::{Action, ExchangeResponse, OrderStatusEntry};
use crate::config::HttpTimeouts;
use crate::error::{CoreError, CoreResult};
use crate::model::Side;
use crate::signer::Signer;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::nonce::NonceManager;

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as u64
}

/// REST sender: signs an `Action` via the external signer process and
/// POSTs the signed envelope to the venue's `/exchange` endpoint.
pub struct RestSender {
    base_url: String,
    http: reqwest::blocking::Client,
    signer: Arc<Signer>,
    wallet_address: String,
    private_key: String,
    is_mainnet: bool,
    nonce: Arc<NonceManager>,
}

impl RestSender {
    pub fn new(
        base_url: impl Into<String>,
        timeouts: &HttpTimeouts,
        signer: Arc<Signer>,
        wallet_address: String,
        private_key: String,
        is_mainnet: bool,
        nonce: Arc<NonceManager>,
    ) -> CoreResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;
        Ok(Self { base_url: base_url.into(), http, signer, wallet_address, private_key, is_mainnet, nonce })
    }

    fn post_action(&self, action: Action) -> CoreResult<ExchangeResponse> {
        let nonce = self.nonce.next();
        let action_value = serde_json::to_value(&action).map_err(CoreError::Parse)?;
        let signature = self.signer.sign(&self.private_key, action_value.clone(), None, nonce, None, self.is_mainnet)?;

        let body = serde_json::json!({
            "action": action_value,
            "nonce": nonce,
            "signature": {"r": signature.r, "s": signature.s, "v": signature.v},
            "vaultAddress": serde_json::Value::Null,
        });

        let response = self
            .http
            .post(format!("{}/exchange", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Expired(e.to_string())
                } else {
                    CoreError::NetworkError(e.to_string())
                }
            })?;

        if response.status().as_u16() == 429 {
            return Err(CoreError::RateLimited("HTTP 429".into()));
        }
        if !response.status().is_success() {
            return Err(CoreError::VenueReject(format!("HTTP {}", response.status())));
        }
        response.json().map_err(|e| CoreError::NetworkError(e.to_string()))
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }
}

impl BatchSender for RestSender {
    fn send_batch(&self, orders: &[super::wire::OrderRequest]) -> CoreResult<Vec<OrderStatusEntry>> {
        let action = Action::Order {
            batch: super::wire::BatchOrder { orders: orders.to_vec(), grouping: super::wire::OrderGrouping::Na },
        };
        let response = self.post_action(action)?;
        if response.status != "ok" {
            return Err(CoreError::VenueReject(response.status));
        }
        Ok(response.response.and_then(|b| b.data).map(|d| d.statuses).unwrap_or_default())
    }
}

impl RestSender {
    pub fn cancel(&self, asset: u32, oid: u64) -> CoreResult<()> {
        let action = Action::Cancel { batch: super::wire::BatchCancel { cancels: vec![super::wire::Cancel { asset, oid }] } };
        let response = self.post_action(action)?;
        if response.status != "ok" {
            return Err(CoreError::VenueReject(response.status));
        }
        Ok(())
    }

    pub fn cancel_by_cloid(&self, asset: u32, cloid: super::cloid::Cloid) -> CoreResult<()> {
        let action = Action::CancelByCloid {
            batch: super::wire::BatchCancelCloid { cancels: vec![super::wire::CancelByCloid { asset, cloid }] },
        };
        let response = self.post_action(action)?;
        if response.status != "ok" {
            return Err(CoreError::VenueReject(response.status));
        }
        Ok(())
    }

    pub fn modify(&self, oid: super::wire::OidOrCloid, order: super::wire::OrderRequest) -> CoreResult<()> {
        let action = Action::BatchModify { batch: super::wire::BatchModify { modifies: vec![super::wire::Modify { oid, order }] } };
        let response = self.post_action(action)?;
        if response.status != "ok" {
            return Err(CoreError::VenueReject(response.status));
        }
        Ok(())
    }
}

/// Tracks the private WebSocket channel's health so the adapter can
/// decide whether a signed action may ride the socket instead of REST.
/// `last_message_ms` is updated by the user-event read loop on every
/// inbound frame (including pings), via `note_message`.
pub struct WsHealth {
    connected: AtomicBool,
    last_message_ms: AtomicI64,
    idle_window: Duration,
}

impl WsHealth {
    pub fn new(idle_window: Duration) -> Self {
        Self { connected: AtomicBool::new(false), last_message_ms: AtomicI64::new(0), idle_window }
    }

    pub fn mark_connected(&self) {
        self.connected.store(true, Ordering::Release);
        self.last_message_ms.store(now_ms() as i64, Ordering::Release);
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn note_message(&self) {
        self.last_message_ms.store(now_ms() as i64, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Stable means connected and the stream has produced a message
    /// within the configured idle window.
    pub fn is_stable(&self) -> bool {
        if !self.is_connected() {
            return false;
        }
        let elapsed_ms = now_ms() as i64 - self.last_message_ms.load(Ordering::Acquire);
        elapsed_ms >= 0 && (elapsed_ms as u64) < self.idle_window.as_millis() as u64
    }
}

/// Widen the best bid/ask into a limit price an IOC order can use as a
/// synthetic "market" order, since the venue has no native market type.
pub fn synthesize_market_price(top_of_book: Decimal, side: Side, slippage_bps: u32) -> Decimal {
    let slippage = top_of_book * Decimal::from(slippage_bps) / Decimal::from(10_000u32);
    match side {
        Side::Buy => top_of_book + slippage,
        Side::Sell => top_of_book - slippage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn synthesized_buy_price_is_widened_upward() {
        let price = synthesize_market_price(dec!(100), Side::Buy, 50);
        assert_eq!(price, dec!(100.50));
    }

    #[test]
    fn synthesized_sell_price_is_widened_downward() {
        let price = synthesize_market_price(dec!(100), Side::Sell, 50);
        assert_eq!(price, dec!(99.50));
    }

    #[test]
    fn ws_health_is_unstable_before_any_message() {
        let health = WsHealth::new(Duration::from_secs(5));
        assert!(!health.is_stable());
        health.mark_connected();
        assert!(health.is_stable());
    }
}
