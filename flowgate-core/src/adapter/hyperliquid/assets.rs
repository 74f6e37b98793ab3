//! Asset-universe cache. Perpetual coins map to a dense integer
//! asset id assigned by the venue's `meta` listing order; spot pairs map
//! to `10000 + index` into the venue's `spotMeta` listing. Refreshed on
//! a 5-minute TTL rather than once at startup, since the venue lists
//! new markets without a process restart.

use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const SPOT_ASSET_OFFSET: u32 = 10_000;
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, serde::Deserialize)]
struct MetaResponse {
    universe: Vec<MetaAsset>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct MetaAsset {
    name: String,
    #[serde(rename = "szDecimals")]
    sz_decimals: u32,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct SpotMetaResponse {
    universe: Vec<SpotMetaAsset>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct SpotMetaAsset {
    name: String,
    index: u32,
    #[serde(rename = "szDecimals", default)]
    sz_decimals: u32,
}

struct AssetCache {
    perp: HashMap<String, u32>,
    spot: HashMap<String, u32>,
    size_decimals: HashMap<u32, u32>,
    fetched_at: Instant,
}

pub struct AssetResolver {
    base_url: String,
    http: reqwest::blocking::Client,
    cache: RwLock<Option<AssetCache>>,
}

impl AssetResolver {
    pub fn new(base_url: impl Into<String>, http: reqwest::blocking::Client) -> Self {
        Self { base_url: base_url.into(), http, cache: RwLock::new(None) }
    }

    /// Resolve a symbol to (asset_id, size_decimals), refreshing the
    /// cache first if it is absent or stale.
    pub fn resolve(&self, symbol: &str, is_spot: bool) -> CoreResult<(u32, u32)> {
        self.refresh_if_stale()?;
        let cache = self.cache.read();
        let cache = cache.as_ref().expect("refreshed above");
        let asset = if is_spot { cache.spot.get(symbol) } else { cache.perp.get(symbol) };
        let asset = *asset.ok_or_else(|| CoreError::UnresolvableSymbol(symbol.to_string()))?;
        let decimals = cache.size_decimals.get(&asset).copied().unwrap_or(0);
        Ok((asset, decimals))
    }

    /// Resolve a symbol without knowing in advance whether it is a
    /// perpetual or a spot pair: perpetual coins are checked first since
    /// `PlaceRequest` carries no product-type tag for the adapter to key
    /// on. Returns `(asset_id, is_spot, size_decimals)`.
    pub fn resolve_any(&self, symbol: &str) -> CoreResult<(u32, bool, u32)> {
        self.refresh_if_stale()?;
        let cache = self.cache.read();
        let cache = cache.as_ref().expect("refreshed above");
        if let Some(&asset) = cache.perp.get(symbol) {
            let decimals = cache.size_decimals.get(&asset).copied().unwrap_or(0);
            return Ok((asset, false, decimals));
        }
        if let Some(&asset) = cache.spot.get(symbol) {
            let decimals = cache.size_decimals.get(&asset).copied().unwrap_or(0);
            return Ok((asset, true, decimals));
        }
        Err(CoreError::UnresolvableSymbol(symbol.to_string()))
    }

    /// Quantize a size to the venue's `szDecimals` for this asset,
    /// truncating rather than rounding up so the adapter never submits
    /// a size larger than what the caller asked for.
    pub fn quantize(&self, size: Decimal, decimals: u32) -> Decimal {
        size.trunc_with_scale(decimals)
    }

    fn refresh_if_stale(&self) -> CoreResult<()> {
        {
            let cache = self.cache.read();
            if let Some(cache) = cache.as_ref() {
                if cache.fetched_at.elapsed() < CACHE_TTL {
                    return Ok(());
                }
            }
        }
        let perp_meta: MetaResponse = self
            .http
            .post(format!("{}/info", self.base_url))
            .json(&serde_json::json!({"type": "meta"}))
            .send()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?
            .json()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;
        let spot_meta: SpotMetaResponse = self
            .http
            .post(format!("{}/info", self.base_url))
            .json(&serde_json::json!({"type": "spotMeta"}))
            .send()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?
            .json()
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;

        let mut perp = HashMap::new();
        let mut size_decimals = HashMap::new();
        for (idx, asset) in perp_meta.universe.into_iter().enumerate() {
            let id = idx as u32;
            size_decimals.insert(id, asset.sz_decimals);
            perp.insert(asset.name, id);
        }
        let mut spot = HashMap::new();
        for asset in spot_meta.universe {
            let id = SPOT_ASSET_OFFSET + asset.index;
            size_decimals.insert(id, asset.sz_decimals);
            spot.insert(asset.name, id);
        }

        *self.cache.write() = Some(AssetCache { perp, spot, size_decimals, fetched_at: Instant::now() });
        Ok(())
    }
}
