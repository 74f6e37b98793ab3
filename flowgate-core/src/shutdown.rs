//! Cooperative shutdown flag: a plain atomic owned by `main` and shared
//! by `Arc` reference — every thread that needs to notice shutdown
//! holds a clone, none of them reach for a global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn trigger(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Expose the inner flag for APIs that want the raw `Arc<AtomicBool>`
    /// directly (e.g. [`crate::publisher::Publisher::new`]).
    pub fn inner(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a Ctrl-C handler that triggers the flag exactly once.
/// `flowgate-bin`'s entry point calls this before spawning T_ingress /
/// T_publish / T_stats.
pub fn install_ctrlc_handler(flag: ShutdownFlag) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        tracing::info!("shutdown signal received");
        flag.trigger();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_and_stops_once_triggered() {
        let flag = ShutdownFlag::new();
        assert!(flag.is_running());
        flag.trigger();
        assert!(!flag.is_running());
    }

    #[test]
    fn clones_share_the_same_underlying_flag() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();
        flag.trigger();
        assert!(!clone.is_running());
    }
}
