//! Lock-free object pools (C2).
//!
//! Pre-allocated object pools backed by crossbeam's `ArrayQueue` so the
//! ingress/publish hot paths never call into the allocator. Objects are
//! borrowed and returned explicitly, or automatically via [`PoolGuard`].

use crossbeam::queue::ArrayQueue;
use std::sync::Arc;

/// Lock-free, fixed-capacity object pool.
///
/// All `T::default()` instances are allocated once at construction.
/// Acquiring past capacity returns `None` rather than growing the pool —
/// pool exhaustion on the hot path is a sizing bug, not something to
/// paper over with a fallback allocation.
pub struct ObjectPool<T: Default + Clone> {
    pool: Arc<ArrayQueue<T>>,
    capacity: usize,
}

impl<T: Default + Clone> ObjectPool<T> {
    /// Create a new pool, pre-allocating `capacity` objects. Call once at
    /// startup; never in the hot path.
    pub fn new(capacity: usize) -> Self {
        let pool = Arc::new(ArrayQueue::new(capacity));
        for _ in 0..capacity {
            pool.push(T::default()).ok();
        }
        Self { pool, capacity }
    }

    #[inline(always)]
    pub fn acquire(&self) -> Option<T> {
        self.pool.pop()
    }

    /// Return an object to the pool. If the pool is already full the
    /// object is dropped instead of panicking — can happen if a caller
    /// double-releases.
    #[inline(always)]
    pub fn release(&self, obj: T) {
        self.pool.push(obj).ok();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.pool.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty()
    }
}

impl<T: Default + Clone> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            capacity: self.capacity,
        }
    }
}

/// RAII guard returning its object to the pool on drop.
pub struct PoolGuard<T: Default + Clone> {
    obj: Option<T>,
    pool: ObjectPool<T>,
}

impl<T: Default + Clone> PoolGuard<T> {
    pub fn new(obj: T, pool: ObjectPool<T>) -> Self {
        Self { obj: Some(obj), pool }
    }

    pub fn get(&self) -> &T {
        self.obj.as_ref().unwrap()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.obj.as_mut().unwrap()
    }
}

impl<T: Default + Clone> std::ops::Deref for PoolGuard<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: Default + Clone> std::ops::DerefMut for PoolGuard<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<T: Default + Clone> Drop for PoolGuard<T> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.pool.release(obj);
        }
    }
}

/// Pool utilization, exposed on `/metrics` and via C12 stats.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub capacity: usize,
    pub available: usize,
    pub utilization: f64,
}

impl PoolStats {
    pub fn from_pool<T: Default + Clone>(pool: &ObjectPool<T>) -> Self {
        let capacity = pool.capacity();
        let available = pool.available();
        let utilization = if capacity == 0 {
            0.0
        } else {
            1.0 - (available as f64 / capacity as f64)
        };
        Self { capacity, available, utilization }
    }

    pub fn is_near_exhaustion(&self) -> bool {
        self.utilization > 0.9
    }
}
