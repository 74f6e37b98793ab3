//! Exercises the publisher's wire framing against a real TCP client
//! end to end, with the lifecycle processor producing the published
//! messages rather than a hand-built `ExecutionReport`/`Fill` — the
//! seam `ingress.rs`'s own unit tests and `publisher.rs`'s own unit
//! tests each cover in isolation, but never together.

use flowgate_core::adapter::mock::MockAdapter;
use flowgate_core::adapter::ExchangeAdapter;
use flowgate_core::inflight::InFlightTable;
use flowgate_core::lifecycle::LifecycleProcessor;
use flowgate_core::model::{ExecutionReport, PublishMessage};
use flowgate_core::parser::OrderParser;
use flowgate_core::perf::{ObjectPool, RingQueue};
use flowgate_core::publisher::{Publisher, SleepProfile};
use flowgate_core::router::VenueRouter;
use flowgate_core::stats::Stats;
use std::io::{BufReader, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn read_frame(reader: &mut impl Read) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).unwrap();
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).unwrap();
    buf
}

#[test]
fn a_placed_order_reaches_a_subscriber_as_a_report_frame_over_tcp() {
    let router = Arc::new(VenueRouter::new());
    let adapter = Arc::new(MockAdapter::new("bybit"));
    adapter.connect();
    router.register("bybit", Arc::clone(&adapter) as Arc<dyn ExchangeAdapter>);

    let publish_queue: RingQueue<PublishMessage> = RingQueue::new(64);
    let processor = LifecycleProcessor::new(
        router,
        Arc::new(InFlightTable::new()),
        publish_queue.clone(),
        ObjectPool::new(16),
        ObjectPool::new(16),
        Arc::new(Stats::new()),
    );
    let parser = OrderParser::new(ObjectPool::new(16));

    let running = Arc::new(AtomicBool::new(true));
    let publisher = Publisher::new(
        "127.0.0.1:0",
        publish_queue,
        ObjectPool::new(16),
        ObjectPool::new(16),
        Arc::new(Stats::new()),
        SleepProfile::HighPerf,
        Arc::clone(&running),
    )
    .unwrap();
    let addr = publisher.local_addr();

    let client = loop {
        match TcpStream::connect(addr) {
            Ok(s) => break s,
            Err(_) => std::thread::sleep(Duration::from_millis(5)),
        }
    };
    // give the publisher's acceptor thread a moment to register the subscriber
    std::thread::sleep(Duration::from_millis(50));

    let publisher = Arc::new(publisher);
    let run_handle = {
        let publisher = Arc::clone(&publisher);
        std::thread::spawn(move || publisher.run())
    };

    let json = r#"{
        "version": 1, "cl_id": "A1", "action": "place",
        "venue_type": "cex", "venue": "bybit", "product_type": "spot",
        "ts_ns": 1000,
        "details": {"cex_order": {
            "symbol": "ETH/USDT", "side": "buy", "order_type": "limit",
            "time_in_force": "gtc", "size": "1.0", "price": "2500.0"
        }}
    }"#;
    let order = parser.parse(json.as_bytes()).unwrap();
    processor.handle_order(order);

    let mut reader = BufReader::new(client);
    let topic = read_frame(&mut reader);
    let body = read_frame(&mut reader);
    assert_eq!(topic, b"exec.report");
    let report: ExecutionReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.cl_id, "A1");

    running.store(false, Ordering::Relaxed);
    run_handle.join().unwrap();
}
