//! Object Pool Benchmarks
//!
//! Measures acquire/release cost for the lock-free object pools (C2)
//! backing `ExecutionOrder`/`ExecutionReport`/`Fill` on the ingress and
//! publish hot paths, plus contention under concurrent acquire/release.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowgate_core::model::ExecutionOrder;
use flowgate_core::perf::ObjectPool;
use std::sync::Arc;
use std::thread;

fn acquire_release_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/acquire_release");
    group.significance_level(0.01).sample_size(10000);

    let pool: ObjectPool<ExecutionOrder> = ObjectPool::new(4096);

    group.bench_function("round_trip", |b| {
        b.iter(|| {
            let obj = pool.acquire().unwrap();
            pool.release(black_box(obj));
        });
    });

    group.finish();
}

fn acquire_only_until_exhausted_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/acquire_exhaustion");
    group.significance_level(0.01).sample_size(1000);

    group.bench_function("acquire_when_empty", |b| {
        let pool: ObjectPool<ExecutionOrder> = ObjectPool::new(1);
        let _held = pool.acquire().unwrap();
        b.iter(|| black_box(pool.acquire()));
    });

    group.finish();
}

fn contended_pool_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/contention");
    group.significance_level(0.01).sample_size(1000);

    let pool: Arc<ObjectPool<ExecutionOrder>> = Arc::new(ObjectPool::new(4096));

    group.bench_function("4_threads_round_trip", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    thread::spawn(move || {
                        for _ in 0..100 {
                            if let Some(obj) = pool.acquire() {
                                pool.release(obj);
                            }
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, acquire_release_bench, acquire_only_until_exhausted_bench, contended_pool_bench);
criterion_main!(benches);
