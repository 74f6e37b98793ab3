//! Process-wide nonce discipline. Hyperliquid rejects signed actions
//! whose nonce does not strictly increase, so every adapter
//! instance shares one `NonceManager` regardless of how many symbols or
//! order lanes it serves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

pub struct NonceManager {
    last: AtomicU64,
}

impl NonceManager {
    pub fn new() -> Self {
        Self { last: AtomicU64::new(now_ms()) }
    }

    /// Returns `max(now_ms, last + 1)`, retrying on contention.
    pub fn next(&self) -> u64 {
        loop {
            let last = self.last.load(Ordering::Acquire);
            let candidate = now_ms().max(last + 1);
            if self
                .last
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return candidate;
            }
        }
    }

    /// Rebase the counter after a long idle period so the next `next()`
    /// doesn't hand out a value far behind wall-clock time.
    pub fn fast_forward_to_now(&self) {
        self.last.fetch_max(now_ms(), Ordering::AcqRel);
    }
}

impl Default for NonceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_nonces_strictly_increase() {
        let manager = NonceManager::new();
        let a = manager.next();
        let b = manager.next();
        let c = manager.next();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn fast_forward_does_not_move_backwards() {
        let manager = NonceManager::new();
        let a = manager.next();
        manager.fast_forward_to_now();
        let b = manager.next();
        assert!(b > a);
    }
}
