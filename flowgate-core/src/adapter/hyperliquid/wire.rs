//! Wire DTOs for the venue's signed-action exchange API. Field names and
//! shapes (short keys `a`/`b`/`p`/`s`/`r`/`t`/`c` on `OrderRequest`, the
//! `Limit`/`Trigger` split on the order-type placement, cloid-as-hex)
//! mirror the venue's own `exchange` endpoint schema; signing itself
//! never happens here — `super::transport` hands the serialized action
//! to the external signer process and attaches the result.

use super::cloid::Cloid;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum TimeInForce {
    Alo,
    Ioc,
    Gtc,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderTypePlacement {
    Limit {
        tif: TimeInForce,
    },
    Trigger {
        #[serde(with = "rust_decimal::serde::str")]
        trigger_px: Decimal,
        is_market: bool,
        tpsl: TpSl,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TpSl {
    Tp,
    Sl,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub limit_px: Decimal,
    #[serde(rename = "s", with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    #[serde(rename = "t")]
    pub order_type: OrderTypePlacement,
    #[serde(rename = "c")]
    pub cloid: Cloid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderGrouping {
    Na,
    NormalTpsl,
    PositionTpsl,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOrder {
    pub orders: Vec<OrderRequest>,
    pub grouping: OrderGrouping,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancel {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "o")]
    pub oid: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelByCloid {
    pub asset: u32,
    pub cloid: Cloid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCancel {
    pub cancels: Vec<Cancel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCancelCloid {
    pub cancels: Vec<CancelByCloid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OidOrCloid {
    Oid(u64),
    Cloid(Cloid),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modify {
    pub oid: OidOrCloid,
    pub order: OrderRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchModify {
    pub modifies: Vec<Modify>,
}

/// One signed-envelope `action` (the `type`-tagged body Hyperliquid's
/// `/exchange` endpoint expects).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Order {
        #[serde(flatten)]
        batch: BatchOrder,
    },
    Cancel {
        #[serde(flatten)]
        batch: BatchCancel,
    },
    CancelByCloid {
        #[serde(flatten)]
        batch: BatchCancelCloid,
    },
    BatchModify {
        #[serde(flatten)]
        batch: BatchModify,
    },
}

/// Deserialized shape of `/exchange`'s response body, trimmed to what
/// the adapter actually inspects: per-order status plus an optional
/// top-level error string for request-level rejections (bad nonce,
/// malformed signature, rate limit).
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub status: String,
    #[serde(default)]
    pub response: Option<ExchangeResponseBody>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponseBody {
    #[serde(default)]
    pub data: Option<ExchangeResponseData>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponseData {
    #[serde(default)]
    pub statuses: Vec<OrderStatusEntry>,
}

/// One entry of `response.data.statuses`: either `{"resting": {"oid": N}}`,
/// `{"filled": {"oid": N, ...}}`, or `{"error": "..."}`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusEntry {
    #[serde(default)]
    pub resting: Option<RestingOrder>,
    #[serde(default)]
    pub filled: Option<FilledOrder>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RestingOrder {
    pub oid: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FilledOrder {
    pub oid: u64,
}

/// One frame off the private `userEvents` WebSocket channel. Only the
/// `"user"` channel carries fills; other channels (subscription acks,
/// pongs-as-JSON) parse with an empty `data.fills`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEventFrame {
    pub channel: String,
    #[serde(default)]
    pub data: UserEventData,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserEventData {
    #[serde(default)]
    pub fills: Vec<WsFill>,
}

/// One fill out of `data.fills`, in the venue's own field names.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsFill {
    pub coin: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub px: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    pub oid: u64,
    pub time: u64,
    pub tid: u64,
    #[serde(with = "rust_decimal::serde::str", default)]
    pub fee: Decimal,
    #[serde(default)]
    pub fee_token: String,
    #[serde(default)]
    pub crossed: bool,
    #[serde(default)]
    pub cloid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_request_serializes_with_short_keys() {
        let req = OrderRequest {
            asset: 0,
            is_buy: true,
            limit_px: dec!(50000),
            sz: dec!(0.1),
            reduce_only: false,
            order_type: OrderTypePlacement::Limit { tif: TimeInForce::Gtc },
            cloid: Cloid::generate(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["a"], 0);
        assert_eq!(json["b"], true);
        assert_eq!(json["p"], "50000");
        assert_eq!(json["s"], "0.1");
    }

    #[test]
    fn action_tags_order_variant() {
        let action = Action::Order {
            batch: BatchOrder {
                orders: vec![],
                grouping: OrderGrouping::Na,
            },
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "order");
    }

    #[test]
    fn exchange_response_parses_resting_status() {
        let raw = r#"{"status":"ok","response":{"type":"order","data":{"statuses":[{"resting":{"oid":123}}]}}}"#;
        let parsed: ExchangeResponse = serde_json::from_str(raw).unwrap();
        let statuses = &parsed.response.unwrap().data.unwrap().statuses;
        assert_eq!(statuses[0].resting.as_ref().unwrap().oid, 123);
    }

    #[test]
    fn user_event_frame_parses_a_fill() {
        let raw = r#"{
            "channel": "user",
            "data": {
                "fills": [{
                    "coin": "BTC",
                    "px": "50000.5",
                    "sz": "0.01",
                    "oid": 123,
                    "time": 1700000000000,
                    "tid": 456,
                    "fee": "0.02",
                    "feeToken": "USDC",
                    "crossed": true,
                    "cloid": "0x00000000000000000000000000000001"
                }]
            }
        }"#;
        let frame: UserEventFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.channel, "user");
        assert_eq!(frame.data.fills.len(), 1);
        let fill = &frame.data.fills[0];
        assert_eq!(fill.coin, "BTC");
        assert_eq!(fill.oid, 123);
        assert!(fill.crossed);
        assert_eq!(fill.cloid.as_deref(), Some("0x00000000000000000000000000000001"));
    }

    #[test]
    fn user_event_frame_defaults_fills_empty_for_other_channels() {
        let raw = r#"{"channel": "subscriptionResponse"}"#;
        let frame: UserEventFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.channel, "subscriptionResponse");
        assert!(frame.data.fills.is_empty());
    }
}
