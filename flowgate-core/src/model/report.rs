//! Egress wire records: [`ExecutionReport`] and [`Fill`].

use super::order::Tags;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Accepted,
    #[default]
    Rejected,
    Canceled,
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    #[default]
    Ok,
    InvalidParams,
    RiskBlocked,
    VenueReject,
    InsufficientBalance,
    MinSize,
    PriceOutOfBounds,
    RateLimited,
    NetworkError,
    Expired,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::Ok => "ok",
            ReasonCode::InvalidParams => "invalid_params",
            ReasonCode::RiskBlocked => "risk_blocked",
            ReasonCode::VenueReject => "venue_reject",
            ReasonCode::InsufficientBalance => "insufficient_balance",
            ReasonCode::MinSize => "min_size",
            ReasonCode::PriceOutOfBounds => "price_out_of_bounds",
            ReasonCode::RateLimited => "rate_limited",
            ReasonCode::NetworkError => "network_error",
            ReasonCode::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub cl_id: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_order_id: Option<String>,
    pub reason_code: ReasonCode,
    pub reason_text: String,
    pub ts_ns: u64,
    #[serde(default)]
    pub tags: Tags,
}

impl ExecutionReport {
    pub fn accepted(cl_id: impl Into<String>, exchange_order_id: Option<String>, ts_ns: u64, tags: Tags) -> Self {
        Self {
            cl_id: cl_id.into(),
            status: ReportStatus::Accepted,
            exchange_order_id,
            reason_code: ReasonCode::Ok,
            reason_text: String::new(),
            ts_ns,
            tags,
        }
    }

    pub fn rejected(
        cl_id: impl Into<String>,
        reason_code: ReasonCode,
        reason_text: impl Into<String>,
        ts_ns: u64,
        tags: Tags,
    ) -> Self {
        Self {
            cl_id: cl_id.into(),
            status: ReportStatus::Rejected,
            exchange_order_id: None,
            reason_code,
            reason_text: reason_text.into(),
            ts_ns,
            tags,
        }
    }

    pub fn canceled_ok(cl_id: impl Into<String>, exchange_order_id: Option<String>, ts_ns: u64, tags: Tags) -> Self {
        Self {
            cl_id: cl_id.into(),
            status: ReportStatus::Canceled,
            exchange_order_id,
            reason_code: ReasonCode::Ok,
            reason_text: String::new(),
            ts_ns,
            tags,
        }
    }

    pub fn replaced_ok(cl_id: impl Into<String>, exchange_order_id: Option<String>, ts_ns: u64, tags: Tags) -> Self {
        Self {
            cl_id: cl_id.into(),
            status: ReportStatus::Replaced,
            exchange_order_id,
            reason_code: ReasonCode::Ok,
            reason_text: String::new(),
            ts_ns,
            tags,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liquidity {
    Maker,
    Taker,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fill {
    pub cl_id: String,
    pub exchange_order_id: String,
    pub exec_id: String,
    pub symbol_or_pair: String,
    pub price: Decimal,
    pub size: Decimal,
    pub fee_currency: String,
    pub fee_amount: Decimal,
    pub liquidity: Liquidity,
    pub ts_ns: u64,
    #[serde(default)]
    pub tags: Tags,
}

impl Fill {
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }
}

/// Messages carried on the egress plane; the publisher (C11) serializes
/// whichever variant it pops and picks the matching topic frame.
#[derive(Debug, Clone)]
pub enum PublishMessage {
    Report(ExecutionReport),
    Fill(Fill),
}

impl PublishMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            PublishMessage::Report(_) => "exec.report",
            PublishMessage::Fill(_) => "exec.fill",
        }
    }
}

impl Default for PublishMessage {
    fn default() -> Self {
        PublishMessage::Report(ExecutionReport::default())
    }
}
