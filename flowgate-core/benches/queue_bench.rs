//! Ring Queue Benchmarks
//!
//! Measures push/pop cost for the SPSC ring (C2) carrying
//! `ExecutionOrder`/`PublishMessage` between T_ingress, the lifecycle
//! processor, and T_publish, plus producer/consumer throughput under
//! the multi-producer fan-in the ingress side actually sees.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowgate_core::model::ExecutionOrder;
use flowgate_core::perf::RingQueue;
use std::thread;
use std::time::Duration;

fn push_pop_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue/push_pop");
    group.significance_level(0.01).sample_size(10000);

    let queue: RingQueue<ExecutionOrder> = RingQueue::new(4096);

    group.bench_function("round_trip", |b| {
        b.iter(|| {
            queue.push(ExecutionOrder::default()).ok();
            black_box(queue.pop());
        });
    });

    group.finish();
}

fn push_when_full_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue/push_when_full");
    group.significance_level(0.01).sample_size(1000);

    group.bench_function("rejected_push", |b| {
        let queue: RingQueue<ExecutionOrder> = RingQueue::new(1);
        queue.push(ExecutionOrder::default()).unwrap();
        b.iter(|| {
            let _ = black_box(queue.push(ExecutionOrder::default()));
        });
    });

    group.finish();
}

fn spsc_throughput_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue/spsc_throughput");
    group.significance_level(0.01).sample_size(100);

    group.bench_function("10k_items_one_producer_one_consumer", |b| {
        b.iter(|| {
            let queue: RingQueue<ExecutionOrder> = RingQueue::new(4096);
            let producer_queue = queue.clone();
            let producer = thread::spawn(move || {
                for _ in 0..10_000 {
                    while producer_queue.push(ExecutionOrder::default()).is_err() {
                        thread::sleep(Duration::from_nanos(1));
                    }
                }
            });
            let mut received = 0;
            while received < 10_000 {
                if queue.pop().is_some() {
                    received += 1;
                }
            }
            producer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, push_pop_bench, push_when_full_bench, spsc_throughput_bench);
criterion_main!(benches);
