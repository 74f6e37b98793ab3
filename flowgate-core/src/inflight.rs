//! In-flight order table (C6).
//!
//! Two indices — by `client_order_id` and by `(venue, exchange_order_id)`
//! — share one `parking_lot::Mutex` rather than two independent maps
//! (e.g. two `DashMap`s). Both indices must move in lockstep under one
//! critical section; a pair of independently-locked maps would let a
//! reader observe an entry reachable by `cl_id` but not yet by its
//! exchange id (or vice versa) during a concurrent insert. The critical
//! section is kept to O(log n) map operations — no adapter calls or I/O
//! happen while the lock is held.

use crate::model::InFlightOrder;
use parking_lot::Mutex;
use std::collections::HashMap;

struct Tables {
    by_client_id: HashMap<String, InFlightOrder>,
    by_exchange_key: HashMap<(String, String), String>,
}

pub struct InFlightTable {
    inner: Mutex<Tables>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables {
                by_client_id: HashMap::new(),
                by_exchange_key: HashMap::new(),
            }),
        }
    }

    /// Insert a freshly-placed order. Called before the adapter call
    /// returns, so a crash mid-call never leaves an accepted order
    /// untracked.
    pub fn insert(&self, order: InFlightOrder) {
        let mut tables = self.inner.lock();
        if let Some(exch_id) = order.exchange_order_id.clone() {
            tables
                .by_exchange_key
                .insert((order.venue.clone(), exch_id), order.client_order_id.clone());
        }
        tables.by_client_id.insert(order.client_order_id.clone(), order);
    }

    /// Attach an exchange order id learned after initial insertion (e.g.
    /// on the first async update), populating the secondary index.
    pub fn attach_exchange_id(&self, client_order_id: &str, venue: &str, exchange_order_id: &str) {
        let mut tables = self.inner.lock();
        if let Some(order) = tables.by_client_id.get_mut(client_order_id) {
            order.exchange_order_id = Some(exchange_order_id.to_string());
        } else {
            return;
        }
        tables
            .by_exchange_key
            .insert((venue.to_string(), exchange_order_id.to_string()), client_order_id.to_string());
    }

    pub fn get_by_client_id(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.inner.lock().by_client_id.get(client_order_id).cloned()
    }

    pub fn get_by_exchange_key(&self, venue: &str, exchange_order_id: &str) -> Option<InFlightOrder> {
        let tables = self.inner.lock();
        let cl_id = tables
            .by_exchange_key
            .get(&(venue.to_string(), exchange_order_id.to_string()))?;
        tables.by_client_id.get(cl_id).cloned()
    }

    /// Apply a mutation in place under the single critical section,
    /// avoiding a clone-mutate-reinsert round trip for hot-path updates
    /// (fills, state transitions).
    pub fn with_mut<R>(&self, client_order_id: &str, f: impl FnOnce(&mut InFlightOrder) -> R) -> Option<R> {
        let mut tables = self.inner.lock();
        tables.by_client_id.get_mut(client_order_id).map(f)
    }

    /// Remove a terminal order from both indices, within a bounded delay
    /// after its terminal report is published.
    pub fn remove(&self, client_order_id: &str) -> Option<InFlightOrder> {
        let mut tables = self.inner.lock();
        let order = tables.by_client_id.remove(client_order_id)?;
        if let Some(exch_id) = &order.exchange_order_id {
            tables.by_exchange_key.remove(&(order.venue.clone(), exch_id.clone()));
        }
        Some(order)
    }

    pub fn contains(&self, client_order_id: &str) -> bool {
        self.inner.lock().by_client_id.contains_key(client_order_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_client_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InFlightTable {
    fn default() -> Self {
        Self::new()
    }
}
