//! Client-order-id mapping. Hyperliquid identifies orders by a
//! 128-bit hex `cloid` it echoes back on every update; callers of this
//! adapter identify them by the upstream `cl_id` string. `CloidMap` keeps
//! both directions plus the bracket tp/sl role a cloid plays, so a fill
//! on a bracket leg can be attributed back to the parent order.

use parking_lot::RwLock;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A 128-bit client order id, serialized as a `0x`-prefixed 32-hex-digit
/// string, mirroring the wire shape the venue expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(into = "String")]
pub struct Cloid(u128);

impl Cloid {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(u128::from_be_bytes(bytes))
    }
}

impl fmt::Display for Cloid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:032x}", self.0)
    }
}

impl From<Cloid> for String {
    fn from(value: Cloid) -> Self {
        value.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid cloid: {0}")]
pub struct ParseCloidError(String);

impl FromStr for Cloid {
    type Err = ParseCloidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        u128::from_str_radix(stripped, 16).map(Cloid).map_err(|_| ParseCloidError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketRole {
    TakeProfit,
    StopLoss,
}

#[derive(Default)]
pub struct CloidMap {
    to_cl_id: RwLock<HashMap<Cloid, String>>,
    to_cloid: RwLock<HashMap<String, Cloid>>,
    roles: RwLock<HashMap<Cloid, BracketRole>>,
}

impl CloidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, cl_id: &str, cloid: Cloid) {
        self.to_cl_id.write().insert(cloid, cl_id.to_string());
        self.to_cloid.write().insert(cl_id.to_string(), cloid);
    }

    pub fn insert_bracket_leg(&self, cl_id: &str, cloid: Cloid, role: BracketRole) {
        self.insert(cl_id, cloid);
        self.roles.write().insert(cloid, role);
    }

    pub fn cl_id_for(&self, cloid: Cloid) -> Option<String> {
        self.to_cl_id.read().get(&cloid).cloned()
    }

    pub fn cloid_for(&self, cl_id: &str) -> Option<Cloid> {
        self.to_cloid.read().get(cl_id).copied()
    }

    pub fn role_of(&self, cloid: Cloid) -> Option<BracketRole> {
        self.roles.read().get(&cloid).copied()
    }

    pub fn remove_by_cl_id(&self, cl_id: &str) {
        if let Some(cloid) = self.to_cloid.write().remove(cl_id) {
            self.to_cl_id.write().remove(&cloid);
            self.roles.write().remove(&cloid);
        }
    }
}
