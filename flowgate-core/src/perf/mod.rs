//! Low-level performance primitives used on the ingress/publish hot path:
//! CPU pinning and real-time scheduling, lock-free object pools, and the
//! ring queue. Cache-line isolation for C12's counters uses
//! `crossbeam_utils::CachePadded` directly rather than a primitive of
//! its own.

pub mod cpu;
pub mod pools;
pub mod queue;

pub use cpu::{num_cores, pin_to_core, set_realtime_priority};
pub use pools::{ObjectPool, PoolGuard, PoolStats};
pub use queue::{RingQueue, DEFAULT_RING_CAPACITY};
