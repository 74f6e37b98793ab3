//! Signed-action batcher. Two lanes — fast (IOC/GTC) and slow
//! (ALO) — are drained by one background thread at a fixed cadence.
//! Each submitted order gets its own future: a result slot guarded by a
//! mutex and condition variable rather than a oneshot channel, so the
//! waiting caller thread (an adapter method invoked from `T_ingress`)
//! blocks without pulling in an async runtime on the hot path.

use super::wire::{OrderRequest, OrderStatusEntry};
use crate::error::{CoreError, CoreResult};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Fast,
    Slow,
}

/// Implemented by whatever actually signs and POSTs a batch. Kept as a
/// trait so tests can exercise the batcher without real network or
/// signer I/O.
pub trait BatchSender: Send + Sync {
    fn send_batch(&self, orders: &[OrderRequest]) -> CoreResult<Vec<OrderStatusEntry>>;
}

struct ResultSlot {
    state: Mutex<Option<CoreResult<OrderStatusEntry>>>,
    ready: Condvar,
}

impl ResultSlot {
    fn new() -> Arc<Self> {
        Arc::new(Self { state: Mutex::new(None), ready: Condvar::new() })
    }

    fn fulfill(&self, result: CoreResult<OrderStatusEntry>) {
        let mut guard = self.state.lock().unwrap();
        *guard = Some(result);
        self.ready.notify_one();
    }

    fn wait(&self, deadline: Duration) -> CoreResult<OrderStatusEntry> {
        let guard = self.state.lock().unwrap();
        let (mut guard, timed_out) = self
            .ready
            .wait_timeout_while(guard, deadline, |state| state.is_none())
            .unwrap();
        match guard.take() {
            Some(result) => result,
            None => {
                debug_assert!(timed_out.timed_out());
                Err(CoreError::Expired("batcher result wait".into()))
            }
        }
    }
}

struct BatchItem {
    order: OrderRequest,
    slot: Arc<ResultSlot>,
}

const MIN_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

struct BatcherState {
    fast: Mutex<VecDeque<BatchItem>>,
    slow: Mutex<VecDeque<BatchItem>>,
    backoff_until: Mutex<Option<Instant>>,
    current_backoff: Mutex<Duration>,
    max_batch: usize,
    sender: Arc<dyn BatchSender>,
}

/// Owns the background drain thread; dropping the last `Arc` to the
/// shared state lets the thread exit once the channel it polls is
/// empty and `running` is cleared (see [`PlaceBatcher::shutdown`]).
pub struct PlaceBatcher {
    state: Arc<BatcherState>,
    running: Arc<std::sync::atomic::AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PlaceBatcher {
    pub fn start(cadence: Duration, max_batch: usize, sender: Arc<dyn BatchSender>) -> Self {
        let state = Arc::new(BatcherState {
            fast: Mutex::new(VecDeque::new()),
            slow: Mutex::new(VecDeque::new()),
            backoff_until: Mutex::new(None),
            current_backoff: Mutex::new(MIN_BACKOFF),
            max_batch,
            sender,
        });
        let running = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let handle = {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            thread::spawn(move || drain_loop(state, running, cadence))
        };
        Self { state, running, handle: Some(handle) }
    }

    /// Queue an order and block until its slot in a flushed batch is
    /// answered or `deadline` elapses.
    pub fn submit(&self, order: OrderRequest, lane: Lane, deadline: Duration) -> CoreResult<OrderStatusEntry> {
        let slot = ResultSlot::new();
        let item = BatchItem { order, slot: Arc::clone(&slot) };
        let queue = match lane {
            Lane::Fast => &self.state.fast,
            Lane::Slow => &self.state.slow,
        };
        queue.lock().unwrap().push_back(item);
        slot.wait(deadline)
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, std::sync::atomic::Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlaceBatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain_loop(state: Arc<BatcherState>, running: Arc<std::sync::atomic::AtomicBool>, cadence: Duration) {
    while running.load(std::sync::atomic::Ordering::Acquire) {
        thread::sleep(cadence);
        if let Some(until) = *state.backoff_until.lock().unwrap() {
            if Instant::now() < until {
                continue;
            }
        }
        drain_once(&state);
    }
}

fn drain_once(state: &BatcherState) {
    let items = {
        let mut fast = state.fast.lock().unwrap();
        if !fast.is_empty() {
            fast.drain(..fast.len().min(state.max_batch)).collect::<Vec<_>>()
        } else {
            drop(fast);
            let mut slow = state.slow.lock().unwrap();
            slow.drain(..slow.len().min(state.max_batch)).collect::<Vec<_>>()
        }
    };
    if items.is_empty() {
        return;
    }

    let orders: Vec<OrderRequest> = items.iter().map(|i| i.order.clone()).collect();
    match state.sender.send_batch(&orders) {
        Ok(statuses) if statuses.len() == items.len() => {
            *state.current_backoff.lock().unwrap() = MIN_BACKOFF;
            for (item, status) in items.into_iter().zip(statuses) {
                item.slot.fulfill(Ok(status));
            }
        }
        Ok(_) => {
            warn!("batch response length mismatch, failing whole batch");
            for item in items {
                item.slot.fulfill(Err(CoreError::NetworkError("response/order count mismatch".into())));
            }
        }
        Err(CoreError::RateLimited(reason)) => {
            let mut backoff = state.current_backoff.lock().unwrap();
            debug!(%reason, backoff_ms = backoff.as_millis() as u64, "rate limited, backing off");
            *state.backoff_until.lock().unwrap() = Some(Instant::now() + *backoff);
            *backoff = (*backoff * 2).min(MAX_BACKOFF);
            // Requeue at the front of the fast lane so ordering within
            // the lane is preserved across the backoff window.
            let mut fast = state.fast.lock().unwrap();
            for item in items.into_iter().rev() {
                fast.push_front(item);
            }
        }
        Err(err) => {
            let message = err.to_string();
            for item in items {
                item.slot.fulfill(Err(CoreError::NetworkError(message.clone())));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::hyperliquid::cloid::Cloid;
    use crate::adapter::hyperliquid::wire::{OrderTypePlacement, RestingOrder, TimeInForce};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn order(oid_seed: u32) -> OrderRequest {
        OrderRequest {
            asset: oid_seed,
            is_buy: true,
            limit_px: dec!(100),
            sz: dec!(1),
            reduce_only: false,
            order_type: OrderTypePlacement::Limit { tif: TimeInForce::Gtc },
            cloid: Cloid::generate(),
        }
    }

    struct AlwaysResting;
    impl BatchSender for AlwaysResting {
        fn send_batch(&self, orders: &[OrderRequest]) -> CoreResult<Vec<OrderStatusEntry>> {
            Ok(orders
                .iter()
                .enumerate()
                .map(|(i, _)| OrderStatusEntry { resting: Some(RestingOrder { oid: i as u64 }), filled: None, error: None })
                .collect())
        }
    }

    #[test]
    fn submitted_order_is_answered_after_a_flush() {
        let mut batcher = PlaceBatcher::start(Duration::from_millis(10), 8, Arc::new(AlwaysResting));
        let result = batcher.submit(order(1), Lane::Fast, Duration::from_secs(2)).unwrap();
        assert_eq!(result.resting.unwrap().oid, 0);
        batcher.shutdown();
    }

    struct RateLimitedThenOk {
        calls: AtomicU32,
    }
    impl BatchSender for RateLimitedThenOk {
        fn send_batch(&self, orders: &[OrderRequest]) -> CoreResult<Vec<OrderStatusEntry>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(CoreError::RateLimited("too many requests".into()));
            }
            Ok(orders.iter().map(|_| OrderStatusEntry { resting: Some(RestingOrder { oid: 7 }), filled: None, error: None }).collect())
        }
    }

    #[test]
    fn rate_limited_batch_is_requeued_and_eventually_answered() {
        let mut batcher =
            PlaceBatcher::start(Duration::from_millis(5), 8, Arc::new(RateLimitedThenOk { calls: AtomicU32::new(0) }));
        let result = batcher.submit(order(1), Lane::Fast, Duration::from_secs(2)).unwrap();
        assert_eq!(result.resting.unwrap().oid, 7);
        batcher.shutdown();
    }
}
