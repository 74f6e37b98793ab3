//! Fixed-capacity ring queue (C2) carrying [`crate::model::ExecutionOrder`]
//! from ingress to the lifecycle processor, and [`crate::model::PublishMessage`]
//! from the processor to the publisher.
//!
//! Backed by `crossbeam::queue::ArrayQueue`, same as [`super::pools`] —
//! the queue is logically single-producer/single-consumer, but multiple
//! ingress sources (the sync socket reader and async adapter callback
//! threads) fan in through a short `parking_lot::Mutex`-guarded push in
//! the lifecycle processor rather than requiring the ring itself to
//! arbitrate producers.

use crossbeam::queue::ArrayQueue;
use std::sync::Arc;

/// Default capacity for the ingress and egress rings, sized generously
/// above the expected in-flight order count so backpressure (`QueueFull`)
/// is reached only under sustained overload, not routine bursts.
pub const DEFAULT_RING_CAPACITY: usize = 65_536;

pub struct RingQueue<T> {
    inner: Arc<ArrayQueue<T>>,
}

impl<T> RingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self { inner: Arc::new(ArrayQueue::new(capacity)) }
    }

    /// Push a value, returning it back on failure instead of panicking so
    /// the caller can retry, drop, or count the overflow in stats (C12).
    #[inline(always)]
    pub fn push(&self, value: T) -> Result<(), T> {
        self.inner.push(value)
    }

    #[inline(always)]
    pub fn pop(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<T> Clone for RingQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_preserves_fifo_order() {
        let q = RingQueue::<u32>::new(4);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn push_past_capacity_returns_value_back() {
        let q = RingQueue::<u32>::new(2);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.push(3), Err(3));
    }

    #[test]
    fn multiple_producers_single_consumer_preserve_all_items() {
        use std::thread;
        let q = RingQueue::<u32>::new(1024);
        let q1 = q.clone();
        let q2 = q.clone();
        let h1 = thread::spawn(move || {
            for i in 0..200 {
                while q1.push(i).is_err() {}
            }
        });
        let h2 = thread::spawn(move || {
            for i in 200..400 {
                while q2.push(i).is_err() {}
            }
        });
        h1.join().unwrap();
        h2.join().unwrap();
        let mut drained = Vec::new();
        while let Some(v) = q.pop() {
            drained.push(v);
        }
        assert_eq!(drained.len(), 400);
    }
}
