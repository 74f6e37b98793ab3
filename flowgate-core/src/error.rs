//! Internal error taxonomy.
//!
//! Every fallible internal operation returns [`CoreError`]. The lifecycle
//! processor is the only place these are converted into a wire-visible
//! [`crate::model::ReasonCode`] (see [`CoreError::reason_code`]); nowhere
//! else should match on reason codes when a `CoreError` would do. `anyhow`
//! is reserved for the process-entry boundary in the `flowgate-bin` crate.

use crate::model::ReasonCode;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid enum value for {field}: {value}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("price is required for order_type {0:?}")]
    PriceRequired(crate::model::OrderType),

    #[error("stop_price is required for order_type {0:?}")]
    StopPriceRequired(crate::model::OrderType),

    #[error("reduce_only is not valid for spot products")]
    ReduceOnlyOnSpot,

    #[error("size must be > 0, got {0}")]
    NonPositiveSize(rust_decimal::Decimal),

    #[error("unresolvable symbol: {0}")]
    UnresolvableSymbol(String),

    #[error("unknown venue: {0}")]
    UnknownVenue(String),

    #[error("unknown cl_id: {0}")]
    UnknownClientOrderId(String),

    #[error("venue rejected the request: {0}")]
    VenueReject(String),

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("order size below venue minimum: {0}")]
    MinSize(String),

    #[error("price out of venue bounds: {0}")]
    PriceOutOfBounds(String),

    #[error("rate limited by venue: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("deadline expired: {0}")]
    Expired(String),

    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("pool exhausted")]
    PoolExhausted,

    #[error("publish queue full")]
    QueueFull,

    #[error("adapter not connected")]
    NotConnected,
}

impl CoreError {
    /// The canonical reason code this internal error maps to when it
    /// crosses the lifecycle-processor boundary onto the wire.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            CoreError::MissingField(_)
            | CoreError::InvalidEnum { .. }
            | CoreError::PriceRequired(_)
            | CoreError::StopPriceRequired(_)
            | CoreError::ReduceOnlyOnSpot
            | CoreError::NonPositiveSize(_)
            | CoreError::UnresolvableSymbol(_)
            | CoreError::UnknownVenue(_)
            | CoreError::UnknownClientOrderId(_)
            | CoreError::Parse(_) => ReasonCode::InvalidParams,
            CoreError::VenueReject(_) => ReasonCode::VenueReject,
            CoreError::InsufficientBalance(_) => ReasonCode::InsufficientBalance,
            CoreError::MinSize(_) => ReasonCode::MinSize,
            CoreError::PriceOutOfBounds(_) => ReasonCode::PriceOutOfBounds,
            CoreError::RateLimited(_) => ReasonCode::RateLimited,
            CoreError::NetworkError(_) | CoreError::NotConnected | CoreError::Signer(_) => {
                ReasonCode::NetworkError
            }
            CoreError::Expired(_) => ReasonCode::Expired,
            CoreError::PoolExhausted | CoreError::QueueFull => ReasonCode::InvalidParams,
        }
    }
}

/// Thin wrapper so `CoreError`'s `reason_text` can be produced without
/// re-deriving `Display` logic at call sites.
pub fn reason_text(err: &CoreError) -> String {
    format!("{err}")
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
