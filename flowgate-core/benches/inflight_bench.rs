//! In-Flight Table Benchmarks
//!
//! Measures insert/lookup/mutate/remove cost for the in-flight order
//! table (C6) on the path every place/cancel/replace/fill runs through,
//! plus contention across concurrent readers and writers.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowgate_core::inflight::InFlightTable;
use flowgate_core::model::{Category, InFlightOrder, OrderState, OrderType, Side, Tags};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

fn sample_order(cl_id: &str) -> InFlightOrder {
    InFlightOrder::new_pending(
        cl_id.to_string(),
        "bybit".into(),
        Category::Spot,
        "ETH-USDT".into(),
        Side::Buy,
        OrderType::Limit,
        dec!(1.0),
        Some(dec!(2500)),
        false,
        0,
        Tags::default(),
    )
}

fn insert_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflight/insert");
    group.significance_level(0.01).sample_size(10000);

    group.bench_function("insert_new_order", |b| {
        let table = InFlightTable::new();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            table.insert(black_box(sample_order(&i.to_string())));
        });
    });

    group.finish();
}

fn lookup_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflight/lookup");
    group.significance_level(0.01).sample_size(10000);

    let table = InFlightTable::new();
    table.insert(sample_order("A1"));
    table.attach_exchange_id("A1", "bybit", "EX1");

    group.bench_function("get_by_client_id", |b| {
        b.iter(|| black_box(table.get_by_client_id("A1")));
    });

    group.bench_function("get_by_exchange_key", |b| {
        b.iter(|| black_box(table.get_by_exchange_key("bybit", "EX1")));
    });

    group.finish();
}

fn with_mut_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflight/with_mut");
    group.significance_level(0.01).sample_size(10000);

    group.bench_function("transition_in_place", |b| {
        let table = InFlightTable::new();
        table.insert(sample_order("A1"));
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            table.with_mut("A1", |o| {
                o.state = OrderState::PartiallyFilled;
                o.last_update_ts_ns = tick;
            });
        });
    });

    group.finish();
}

fn contended_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflight/contention");
    group.significance_level(0.01).sample_size(1000);

    group.bench_function("4_threads_insert_lookup_remove", |b| {
        b.iter(|| {
            let table = Arc::new(InFlightTable::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let table = Arc::clone(&table);
                    thread::spawn(move || {
                        for i in 0..50 {
                            let cl_id = format!("T{t}-{i}");
                            table.insert(sample_order(&cl_id));
                            let _ = table.get_by_client_id(&cl_id);
                            table.remove(&cl_id);
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

criterion_group!(benches, insert_bench, lookup_bench, with_mut_bench, contended_bench);
criterion_main!(benches);
