//! Ingress order parser (C3).
//!
//! Decodes a self-describing JSON byte slice into a pool-allocated
//! [`ExecutionOrder`]. Scalar fields (`Decimal`, `u64`, enums) never touch
//! the allocator; only variable-length strings (`cl_id`, `venue`, `symbol`,
//! `tags`) do, which is the same trade-off `serde_json` itself makes.
//! Failure returns `None` without panicking so the ingress loop can keep
//! its counters moving and never throws.

use crate::model::ExecutionOrder;
use crate::perf::pools::ObjectPool;
use tracing::debug;

pub struct OrderParser {
    pool: ObjectPool<ExecutionOrder>,
}

impl OrderParser {
    pub fn new(pool: ObjectPool<ExecutionOrder>) -> Self {
        Self { pool }
    }

    /// Parse a raw ingress frame. Returns `None` on pool exhaustion or
    /// malformed JSON; the caller is responsible for bumping the matching
    /// C12 counter (`pool_exhausted` or a parse-failure counter) when this
    /// returns `None`.
    pub fn parse(&self, bytes: &[u8]) -> Option<ExecutionOrder> {
        let mut slot = self.pool.acquire()?;
        match serde_json::from_slice::<ExecutionOrder>(bytes) {
            Ok(decoded) => {
                *slot = decoded;
                Some(slot)
            }
            Err(e) => {
                debug!(error = %e, "failed to parse ingress order");
                self.pool.release(slot);
                None
            }
        }
    }

    pub fn release(&self, order: ExecutionOrder) {
        self.pool.release(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "version": 1, "cl_id": "A1", "action": "place",
            "venue_type": "cex", "venue": "bybit", "product_type": "spot",
            "ts_ns": 1000,
            "details": {"cex_order": {
                "symbol": "ETH/USDT", "side": "buy", "order_type": "limit",
                "time_in_force": "gtc", "size": "0.02", "price": "2500.0"
            }}
        }"#
    }

    #[test]
    fn parses_well_formed_order() {
        let parser = OrderParser::new(ObjectPool::new(4));
        let order = parser.parse(sample_json().as_bytes()).unwrap();
        assert_eq!(order.cl_id, "A1");
    }

    #[test]
    fn malformed_json_returns_none_and_releases_slot() {
        let parser = OrderParser::new(ObjectPool::new(4));
        let available_before = parser.pool.available();
        assert!(parser.parse(b"not json").is_none());
        assert_eq!(parser.pool.available(), available_before);
    }

    #[test]
    fn pool_exhaustion_returns_none() {
        let parser = OrderParser::new(ObjectPool::new(1));
        let held = parser.parse(sample_json().as_bytes()).unwrap();
        assert!(parser.parse(sample_json().as_bytes()).is_none());
        parser.release(held);
    }
}
