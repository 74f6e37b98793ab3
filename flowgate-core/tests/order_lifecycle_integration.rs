//! End-to-end coverage of the order-lifecycle pipeline: a raw ingress
//! JSON frame goes in through `OrderParser`, the lifecycle processor
//! resolves a venue through `VenueRouter` and mutates `InFlightTable`,
//! and a publishable message comes out the other side on the publish
//! ring. Exercises place/accept, place/reject (bad params and unknown
//! venue), fill delivery, cancel, and replace end to end rather than
//! unit-testing each module in isolation.

use flowgate_core::adapter::mock::MockAdapter;
use flowgate_core::adapter::{ExchangeAdapter, FillData};
use flowgate_core::inflight::InFlightTable;
use flowgate_core::lifecycle::LifecycleProcessor;
use flowgate_core::model::{ExecutionReport, Fill, PublishMessage, ReasonCode, ReportStatus};
use flowgate_core::parser::OrderParser;
use flowgate_core::perf::{ObjectPool, RingQueue};
use flowgate_core::router::VenueRouter;
use flowgate_core::stats::Stats;
use std::sync::Arc;

fn place_order_json(cl_id: &str, venue: &str) -> String {
    format!(
        r#"{{
            "version": 1, "cl_id": "{cl_id}", "action": "place",
            "venue_type": "cex", "venue": "{venue}", "product_type": "spot",
            "ts_ns": 1000,
            "details": {{"cex_order": {{
                "symbol": "ETH/USDT", "side": "buy", "order_type": "limit",
                "time_in_force": "gtc", "size": "1.0", "price": "2500.0"
            }}}}
        }}"#
    )
}

fn cancel_order_json(cl_id_to_cancel: &str, venue: &str) -> String {
    format!(
        r#"{{
            "version": 1, "cl_id": "cancel-1", "action": "cancel",
            "venue_type": "cex", "venue": "{venue}", "product_type": "spot",
            "ts_ns": 2000,
            "details": {{"cancel": {{"cl_id_to_cancel": "{cl_id_to_cancel}"}}}}
        }}"#
    )
}

struct Harness {
    processor: LifecycleProcessor,
    parser: OrderParser,
    publish_queue: RingQueue<PublishMessage>,
    adapter: Arc<MockAdapter>,
}

fn harness(venue: &str) -> Harness {
    let router = Arc::new(VenueRouter::new());
    let adapter = Arc::new(MockAdapter::new(venue));
    adapter.connect();
    router.register(venue, Arc::clone(&adapter) as Arc<dyn ExchangeAdapter>);

    let publish_queue = RingQueue::new(64);
    let processor = LifecycleProcessor::new(
        router,
        Arc::new(InFlightTable::new()),
        publish_queue.clone(),
        ObjectPool::new(16),
        ObjectPool::new(16),
        Arc::new(Stats::new()),
    );
    let parser = OrderParser::new(ObjectPool::new(16));

    Harness { processor, parser, publish_queue, adapter }
}

fn pop_report(queue: &RingQueue<PublishMessage>) -> ExecutionReport {
    match queue.pop().expect("expected a published message") {
        PublishMessage::Report(r) => r,
        PublishMessage::Fill(_) => panic!("expected a report, got a fill"),
    }
}

fn pop_fill(queue: &RingQueue<PublishMessage>) -> Fill {
    match queue.pop().expect("expected a published message") {
        PublishMessage::Fill(f) => f,
        PublishMessage::Report(_) => panic!("expected a fill, got a report"),
    }
}

#[test]
fn place_order_against_known_venue_is_accepted() {
    let h = harness("bybit");
    let order = h.parser.parse(place_order_json("A1", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(order);

    let report = pop_report(&h.publish_queue);
    assert_eq!(report.cl_id, "A1");
    assert_eq!(report.status, ReportStatus::Accepted);
    assert!(report.exchange_order_id.is_some());
}

#[test]
fn place_order_against_unknown_venue_is_rejected_with_invalid_params() {
    let h = harness("bybit");
    let order = h.parser.parse(place_order_json("A1", "nosuchvenue").as_bytes()).unwrap();
    h.processor.handle_order(order);

    let report = pop_report(&h.publish_queue);
    assert_eq!(report.status, ReportStatus::Rejected);
    assert_eq!(report.reason_code, ReasonCode::InvalidParams);
}

#[test]
fn place_order_with_non_positive_size_is_rejected_before_reaching_the_adapter() {
    let h = harness("bybit");
    let json = r#"{
        "version": 1, "cl_id": "A1", "action": "place",
        "venue_type": "cex", "venue": "bybit", "product_type": "spot",
        "ts_ns": 1000,
        "details": {"cex_order": {
            "symbol": "ETH/USDT", "side": "buy", "order_type": "limit",
            "time_in_force": "gtc", "size": "0", "price": "2500.0"
        }}
    }"#;
    let order = h.parser.parse(json.as_bytes()).unwrap();
    h.processor.handle_order(order);

    let report = pop_report(&h.publish_queue);
    assert_eq!(report.status, ReportStatus::Rejected);
    assert_eq!(report.reason_code, ReasonCode::InvalidParams);
}

#[test]
fn duplicate_place_for_a_known_cl_id_is_dropped_silently() {
    let h = harness("bybit");
    let first = h.parser.parse(place_order_json("A1", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(first);
    let _ = pop_report(&h.publish_queue);

    let second = h.parser.parse(place_order_json("A1", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(second);

    assert!(h.publish_queue.pop().is_none(), "duplicate place must not publish a second report");
}

#[test]
fn accepted_order_can_then_be_canceled() {
    let h = harness("bybit");
    let place = h.parser.parse(place_order_json("A1", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(place);
    let _ = pop_report(&h.publish_queue);

    let cancel = h.parser.parse(cancel_order_json("A1", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(cancel);

    let report = pop_report(&h.publish_queue);
    assert_eq!(report.cl_id, "A1");
    assert_eq!(report.status, ReportStatus::Canceled);
}

#[test]
fn cancel_of_an_order_unknown_at_the_venue_is_still_a_success() {
    let h = harness("bybit");
    h.adapter.mark_unknown_at_venue("ghost");

    let cancel = h.parser.parse(cancel_order_json("ghost", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(cancel);

    let report = pop_report(&h.publish_queue);
    assert_eq!(report.status, ReportStatus::Canceled);
    assert_eq!(report.exchange_order_id, None);
}

#[test]
fn adapter_fill_callback_publishes_a_fill_for_the_tracked_order() {
    let h = harness("bybit");
    let place = h.parser.parse(place_order_json("A1", "bybit").as_bytes()).unwrap();
    h.processor.handle_order(place);
    let _ = pop_report(&h.publish_queue);

    h.processor.handle_fill(
        "bybit",
        FillData {
            client_order_id: Some("A1".to_string()),
            exchange_order_id: "mock-1".to_string(),
            exec_id: "EXEC-1".to_string(),
            symbol_or_pair: "ETH-USDT".to_string(),
            price: rust_decimal::Decimal::new(25000, 1),
            size: rust_decimal::Decimal::new(5, 1),
            fee_currency: "USDT".to_string(),
            fee_amount: rust_decimal::Decimal::new(1, 2),
            is_maker: true,
            ts_ns: 3000,
        },
    );

    let fill = pop_fill(&h.publish_queue);
    assert_eq!(fill.cl_id, "A1");
    assert_eq!(fill.exec_id, "EXEC-1");
}
