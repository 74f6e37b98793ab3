//! Venue router (C5): lowercased venue name → adapter instance.
//!
//! Insertion happens once at startup (`flowgate-bin`'s wiring code);
//! lookups are expected O(1) and run on the ingress hot path, so this is a
//! plain `HashMap` behind a `parking_lot::RwLock` rather than `DashMap` —
//! writers never contend with the hot path after startup, so a single
//! lock with cheap read-side access is simpler than sharded concurrent
//! map bookkeeping we'd never exercise.

use crate::adapter::ExchangeAdapter;
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub struct VenueRouter {
    adapters: RwLock<HashMap<String, Arc<dyn ExchangeAdapter>>>,
}

impl VenueRouter {
    pub fn new() -> Self {
        Self { adapters: RwLock::new(HashMap::new()) }
    }

    /// Register an adapter under its lowercased venue name. Intended for
    /// startup wiring only.
    pub fn register(&self, venue: &str, adapter: Arc<dyn ExchangeAdapter>) {
        self.adapters.write().insert(venue.to_ascii_lowercase(), adapter);
    }

    /// Resolve a venue name (any case) to its adapter. `invalid_params`
    /// with the venue name in the message on miss.
    pub fn resolve(&self, venue: &str) -> CoreResult<Arc<dyn ExchangeAdapter>> {
        let key = venue.to_ascii_lowercase();
        self.adapters
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| CoreError::UnknownVenue(venue.to_string()))
    }

    pub fn venues(&self) -> Vec<String> {
        self.adapters.read().keys().cloned().collect()
    }
}

impl Default for VenueRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::MockAdapter;

    #[test]
    fn resolves_registered_venue_case_insensitively() {
        let router = VenueRouter::new();
        router.register("Bybit", Arc::new(MockAdapter::new("bybit")));
        assert!(router.resolve("BYBIT").is_ok());
        assert!(router.resolve("bybit").is_ok());
    }

    #[test]
    fn unknown_venue_is_invalid_params() {
        let router = VenueRouter::new();
        let err = router.resolve("nosuchvenue").unwrap_err();
        assert_eq!(err.reason_code(), crate::model::ReasonCode::InvalidParams);
    }
}
