//! `flowgate`: the order-routing and execution gateway binary.
//!
//! Wires the library crate's components into three long-running threads
//! (T_ingress, T_publish, T_stats) plus a small Tokio runtime carrying
//! the ambient Prometheus/healthz surface, per venue adapters registered
//! from `--exchange`. Exit codes: `0` clean shutdown, `1` on
//! initialization or fatal runtime failure — both paths run through
//! `anyhow::Result`.

mod cli;
mod ingress;

use anyhow::{Context, Result};
use clap::Parser;
use flowgate_core::adapter::hyperliquid::HyperliquidAdapter;
use flowgate_core::adapter::mock::MockAdapter;
use flowgate_core::adapter::{AdapterError, FillData, OrderUpdate};
use flowgate_core::config::Config;
use flowgate_core::metrics_http::{self, GatewayMetrics};
use flowgate_core::parser::OrderParser;
use flowgate_core::prelude::*;
use flowgate_core::publisher::SleepProfile;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pre-allocated capacity for the order/report/fill object pools.
/// Independent of the ring capacity: pools bound in-flight object
/// count, rings bound queued-but-unprocessed message count.
const POOL_CAPACITY: usize = 8_192;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    cli::init_logging(&args.log_level, args.log_json)?;

    let config = args.into_config()?;
    info!(venues = config.venues.len(), ingress = %config.ingress_endpoint, egress = %config.egress_endpoint, "starting flowgate");

    let shutdown = ShutdownFlag::new();
    flowgate_core::shutdown::install_ctrlc_handler(shutdown.clone()).context("failed to install signal handler")?;

    let router = Arc::new(VenueRouter::new());
    let stats = Arc::new(Stats::new());
    let adapters = build_adapters(&config, &router)?;

    let journal = config
        .journal_path
        .as_ref()
        .map(|path| flowgate_core::journal::AsyncJournal::open(PathBuf::from(path)))
        .transpose()
        .context("failed to open journal")?
        .map(Arc::new);

    let inflight = Arc::new(InFlightTable::new());
    let ingress_queue: RingQueue<ExecutionOrder> = RingQueue::new(DEFAULT_RING_CAPACITY);
    let publish_queue: RingQueue<PublishMessage> = RingQueue::new(DEFAULT_RING_CAPACITY);
    let report_pool = ObjectPool::new(POOL_CAPACITY);
    let fill_pool = ObjectPool::new(POOL_CAPACITY);

    let mut processor = LifecycleProcessor::new(
        Arc::clone(&router),
        Arc::clone(&inflight),
        publish_queue.clone(),
        report_pool.clone(),
        fill_pool.clone(),
        Arc::clone(&stats),
    );
    if let Some(journal) = &journal {
        processor = processor.with_journal(Arc::clone(journal));
    }
    let processor = Arc::new(processor);

    wire_adapter_callbacks(&adapters, &processor);

    let publisher = Arc::new(
        Publisher::new(
            &config.egress_endpoint,
            publish_queue.clone(),
            report_pool,
            fill_pool,
            Arc::clone(&stats),
            SleepProfile::Normal,
            shutdown.inner(),
        )
        .context("failed to bind egress listener")?,
    );

    let _ingress_server = ingress::IngressServer::bind(
        &config.ingress_endpoint,
        ingress_queue.clone(),
        OrderParser::new(ObjectPool::new(POOL_CAPACITY)),
        Arc::clone(&stats),
        shutdown.inner(),
    )
    .context("failed to bind ingress listener")?;

    let publish_handle = {
        let publisher = Arc::clone(&publisher);
        thread::spawn(move || publisher.run())
    };

    let ingress_handle = spawn_ingress_loop(ingress_queue, Arc::clone(&processor), shutdown.clone(), config.cpu_pin, config.realtime);

    let stats_handle = spawn_stats_loop(Arc::clone(&stats), shutdown.clone(), config.stats_interval_secs);

    let metrics_handle = spawn_metrics_server(config.metrics_port, Arc::clone(&stats), shutdown.clone())?;

    while shutdown.is_running() {
        thread::sleep(Duration::from_millis(100));
    }
    info!("shutdown in progress, joining worker threads");

    if let Err(e) = ingress_handle.join() {
        error!(?e, "T_ingress panicked");
    }
    if let Err(e) = publish_handle.join() {
        error!(?e, "T_publish panicked");
    }
    if let Err(e) = stats_handle.join() {
        error!(?e, "T_stats panicked");
    }
    if let Err(e) = metrics_handle.join() {
        error!(?e, "metrics server thread panicked");
    }

    for (name, adapter) in &adapters {
        adapter.disconnect();
        info!(venue = %name, "adapter disconnected");
    }

    let snapshot = stats.snapshot();
    info!(
        orders_received = snapshot.orders_received,
        orders_accepted = snapshot.orders_accepted,
        orders_rejected = snapshot.orders_rejected,
        reports_published = snapshot.reports_published,
        fills_published = snapshot.fills_published,
        "final stats"
    );

    Ok(())
}

/// Initialize and connect one adapter per `--exchange`, registering each
/// into `router` under its venue name. Any unsupported exchange name or
/// adapter initialization failure is an initialization failure for the
/// whole process, matched by returning `Err` here (`main` turns that
/// into exit code 1).
fn build_adapters(config: &Config, router: &Arc<VenueRouter>) -> Result<Vec<(String, Arc<dyn ExchangeAdapter>)>> {
    let mut adapters: Vec<(String, Arc<dyn ExchangeAdapter>)> = Vec::with_capacity(config.venues.len());

    for venue in &config.venues {
        let adapter: Arc<dyn ExchangeAdapter> = match venue.name.to_ascii_lowercase().as_str() {
            "mock" => {
                let adapter = Arc::new(MockAdapter::new(&venue.name));
                adapter.connect();
                adapter
            }
            "hyperliquid" => {
                let base_url = if venue.live_trade { "https://api.hyperliquid.xyz" } else { "https://api.hyperliquid-testnet.xyz" };
                let adapter = Arc::new(HyperliquidAdapter::new(
                    venue.name.clone(),
                    base_url,
                    config.http_timeouts.clone(),
                    config.signer_paths.clone(),
                ));
                if !adapter.initialize(&venue.api_key, &venue.api_secret, !venue.live_trade) {
                    anyhow::bail!("failed to initialize venue '{}': signer process or credentials rejected", venue.name);
                }
                if !adapter.connect() {
                    anyhow::bail!("failed to connect venue '{}'", venue.name);
                }
                adapter
            }
            other => anyhow::bail!("unsupported exchange '{other}'"),
        };
        info!(venue = %venue.name, live_trade = venue.live_trade, "adapter connected");
        router.register(&venue.name, Arc::clone(&adapter));
        adapters.push((venue.name.clone(), adapter));
    }

    Ok(adapters)
}

/// Register each adapter's async callbacks, routing them into the one
/// shared [`LifecycleProcessor`]. Callbacks for a given adapter are
/// serialized by that adapter; the processor's own locking handles the
/// resulting cross-adapter concurrency.
fn wire_adapter_callbacks(adapters: &[(String, Arc<dyn ExchangeAdapter>)], processor: &Arc<LifecycleProcessor>) {
    for (venue, adapter) in adapters {
        let venue_name = venue.clone();
        let update_processor = Arc::clone(processor);
        let update_adapter = Arc::clone(adapter);
        adapter.on_order_update(Arc::new(move |update: OrderUpdate| {
            update_processor.handle_order_update(&venue_name, update_adapter.as_ref(), update);
        }));

        let venue_name = venue.clone();
        let fill_processor = Arc::clone(processor);
        adapter.on_fill(Arc::new(move |fill: FillData| {
            fill_processor.handle_fill(&venue_name, fill);
        }));

        let venue_name = venue.clone();
        adapter.on_error(Arc::new(move |err: AdapterError| {
            warn!(venue = %venue_name, reason_code = ?err.reason_code, message = %err.message, "adapter reported an async error");
        }));
    }
}

/// T_ingress: drains the ingress ring and runs each order through the
/// lifecycle processor. CPU pinning/real-time priority, when requested,
/// apply to this thread — the one actually on the latency-sensitive path.
fn spawn_ingress_loop(
    queue: RingQueue<ExecutionOrder>,
    processor: Arc<LifecycleProcessor>,
    shutdown: ShutdownFlag,
    cpu_pin: Option<usize>,
    realtime: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Some(core) = cpu_pin {
            if let Err(e) = flowgate_core::perf::cpu::pin_to_core(core) {
                warn!(error = %e, core, "failed to pin T_ingress to core");
            }
        }
        if realtime {
            if let Err(e) = flowgate_core::perf::cpu::set_realtime_priority(50) {
                warn!(error = %e, "failed to set T_ingress real-time priority");
            }
        }

        while shutdown.is_running() {
            match queue.pop() {
                Some(order) => processor.handle_order(order),
                None => std::thread::sleep(Duration::from_micros(10)),
            }
        }
    })
}

/// T_stats: periodic log-line emission of the C12 atomics, independent
/// of the continuous `/metrics` scrape surface.
fn spawn_stats_loop(stats: Arc<Stats>, shutdown: ShutdownFlag, interval_secs: u64) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let interval = Duration::from_secs(interval_secs.max(1));
        let tick = Duration::from_millis(200);
        let mut elapsed = Duration::ZERO;
        while shutdown.is_running() {
            thread::sleep(tick);
            elapsed += tick;
            if elapsed < interval {
                continue;
            }
            elapsed = Duration::ZERO;
            let snap = stats.snapshot();
            info!(
                orders_received = snap.orders_received,
                orders_accepted = snap.orders_accepted,
                orders_rejected = snap.orders_rejected,
                reports_published = snap.reports_published,
                fills_published = snap.fills_published,
                pool_exhausted = snap.pool_exhausted,
                queue_full = snap.queue_full,
                latency_avg_ns = snap.avg_latency_ns(),
                "stats"
            );
        }
    })
}

/// Spawns the ambient metrics server on its own small Tokio runtime,
/// entirely off T_ingress/T_publish.
fn spawn_metrics_server(port: u16, stats: Arc<Stats>, shutdown: ShutdownFlag) -> Result<thread::JoinHandle<()>> {
    let addr = format!("0.0.0.0:{port}").parse().context("invalid metrics port")?;
    let metrics = Arc::new(GatewayMetrics::new().context("failed to build metrics registry")?);

    Ok(thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                error!(error = %e, "failed to build metrics runtime");
                return;
            }
        };
        runtime.block_on(async move {
            tokio::select! {
                result = metrics_http::serve(addr, metrics, stats) => {
                    if let Err(e) = result {
                        error!(error = %e, "metrics server exited");
                    }
                }
                _ = poll_until_stopped(shutdown) => {}
            }
        });
    }))
}

async fn poll_until_stopped(shutdown: ShutdownFlag) {
    while shutdown.is_running() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
