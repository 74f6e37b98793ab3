//! Ingress wire record: [`ExecutionOrder`] and its tagged `details` variants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Place,
    Cancel,
    Replace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place => write!(f, "place"),
            Action::Cancel => write!(f, "cancel"),
            Action::Replace => write!(f, "replace"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueType {
    Cex,
    Dex,
    Chain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Spot,
    Perpetual,
    AmmSwap,
    ClmmSwap,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn requires_price(self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit)
    }

    pub fn requires_stop_price(self) -> bool {
        matches!(self, OrderType::Stop | OrderType::StopLimit)
    }
}

/// Time-in-force. Deserializing runs the raw token through
/// [`crate::symbol::normalize_tif`]; a value that normalizer doesn't
/// recognize is kept verbatim in `Other` rather than rejected at parse
/// time, so the dispatcher/validator (not the wire format) is what flags
/// it as `invalid_params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeInForce {
    GTC,
    IOC,
    FOK,
    PostOnly,
    Other(String),
}

impl TimeInForce {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, TimeInForce::Other(_))
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::GTC => write!(f, "GTC"),
            TimeInForce::IOC => write!(f, "IOC"),
            TimeInForce::FOK => write!(f, "FOK"),
            TimeInForce::PostOnly => write!(f, "PostOnly"),
            TimeInForce::Other(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for TimeInForce {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeInForce {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(crate::symbol::normalize_tif(&raw).unwrap_or(TimeInForce::Other(raw)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    Cross,
    Isolated,
    None,
}

pub type Tags = HashMap<String, String>;

/// Bound on `tags` cardinality, enforced by the parser.
pub const MAX_TAGS: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CexOrderDetails {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub size: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default = "default_margin_mode")]
    pub margin_mode: MarginMode,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_margin_mode() -> MarginMode {
    MarginMode::None
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmSwapDetails {
    pub pool: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount_out: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClmmSwapDetails {
    pub pool: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount_out: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqrt_price_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferDetails {
    pub asset: String,
    pub amount: Decimal,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelDetails {
    pub cl_id_to_cancel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceDetails {
    pub cl_id_to_replace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_size: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_price: Option<Decimal>,
}

/// Tagged union keyed implicitly by `product_type`/`action`; serialized
/// under the `details` field as `{"cex_order": {...}}` etc so the wire
/// shape stays self-describing without a second discriminant field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDetails {
    CexOrder(CexOrderDetails),
    AmmSwap(AmmSwapDetails),
    ClmmSwap(ClmmSwapDetails),
    Transfer(TransferDetails),
    Cancel(CancelDetails),
    Replace(ReplaceDetails),
}

impl OrderDetails {
    pub fn as_cex_order(&self) -> Option<&CexOrderDetails> {
        match self {
            OrderDetails::CexOrder(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_cancel(&self) -> Option<&CancelDetails> {
        match self {
            OrderDetails::Cancel(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_replace(&self) -> Option<&ReplaceDetails> {
        match self {
            OrderDetails::Replace(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOrder {
    pub version: u32,
    pub cl_id: String,
    pub action: Action,
    pub venue_type: VenueType,
    pub venue: String,
    pub product_type: ProductType,
    pub details: OrderDetails,
    pub ts_ns: u64,
    #[serde(default)]
    pub tags: Tags,
}

impl ExecutionOrder {
    /// Lowercased routing key; venue lookups are always on the normalized name.
    pub fn venue_key(&self) -> String {
        self.venue.to_ascii_lowercase()
    }
}

impl Default for ExecutionOrder {
    fn default() -> Self {
        Self {
            version: 1,
            cl_id: String::new(),
            action: Action::Place,
            venue_type: VenueType::Cex,
            venue: String::new(),
            product_type: ProductType::Spot,
            details: OrderDetails::Cancel(CancelDetails {
                cl_id_to_cancel: String::new(),
                symbol: None,
                exchange_order_id: None,
            }),
            ts_ns: 0,
            tags: HashMap::new(),
        }
    }
}
