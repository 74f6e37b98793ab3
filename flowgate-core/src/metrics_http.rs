//! Metrics surface: the C12 atomics exposed continuously over HTTP in
//! Prometheus text format, plus a `/healthz` liveness endpoint. Built
//! on `prometheus::Registry` and `hyper`. The hot path never touches
//! Prometheus types directly; a scrape pulls a [`crate::stats::Stats`]
//! snapshot and copies it into the registry's gauges on demand.

use crate::stats::Stats;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub struct GatewayMetrics {
    registry: Registry,
    orders_received: IntCounter,
    orders_accepted: IntCounter,
    orders_rejected: IntCounter,
    reports_published: IntCounter,
    fills_published: IntCounter,
    pool_exhausted: IntCounter,
    queue_full: IntCounter,
    latency_min_ns: IntGauge,
    latency_max_ns: IntGauge,
    latency_avg_ns: IntGauge,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        macro_rules! counter {
            ($name:literal, $help:literal) => {{
                let c = IntCounter::new($name, $help)?;
                registry.register(Box::new(c.clone()))?;
                c
            }};
        }
        macro_rules! gauge {
            ($name:literal, $help:literal) => {{
                let g = IntGauge::new($name, $help)?;
                registry.register(Box::new(g.clone()))?;
                g
            }};
        }

        Ok(Self {
            orders_received: counter!("flowgate_orders_received_total", "orders received on ingress"),
            orders_accepted: counter!("flowgate_orders_accepted_total", "orders accepted by a venue"),
            orders_rejected: counter!("flowgate_orders_rejected_total", "orders rejected before or by a venue"),
            reports_published: counter!("flowgate_reports_published_total", "ExecutionReports published"),
            fills_published: counter!("flowgate_fills_published_total", "Fills published"),
            pool_exhausted: counter!("flowgate_pool_exhausted_total", "object pool acquire failures"),
            queue_full: counter!("flowgate_queue_full_total", "publish queue push failures"),
            latency_min_ns: gauge!("flowgate_latency_min_ns", "minimum observed ingress-to-publish latency"),
            latency_max_ns: gauge!("flowgate_latency_max_ns", "maximum observed ingress-to-publish latency"),
            latency_avg_ns: gauge!("flowgate_latency_avg_ns", "average observed ingress-to-publish latency"),
            registry,
        })
    }

    /// Pull a fresh snapshot from the live atomics into the
    /// Prometheus types. Counters are monotonic by construction
    /// (`Stats` never decrements) so resetting-then-adding the delta
    /// would double-count across restarts; instead each counter tracks
    /// its own last-seen value and only advances by the delta.
    pub fn sync_from_stats(&self, stats: &Stats, last: &mut LastSynced) {
        let snap = stats.snapshot();
        self.orders_received.inc_by(snap.orders_received.saturating_sub(last.orders_received));
        self.orders_accepted.inc_by(snap.orders_accepted.saturating_sub(last.orders_accepted));
        self.orders_rejected.inc_by(snap.orders_rejected.saturating_sub(last.orders_rejected));
        self.reports_published.inc_by(snap.reports_published.saturating_sub(last.reports_published));
        self.fills_published.inc_by(snap.fills_published.saturating_sub(last.fills_published));
        self.pool_exhausted.inc_by(snap.pool_exhausted.saturating_sub(last.pool_exhausted));
        self.queue_full.inc_by(snap.queue_full.saturating_sub(last.queue_full));
        self.latency_min_ns.set(snap.latency_min_ns as i64);
        self.latency_max_ns.set(snap.latency_max_ns as i64);
        self.latency_avg_ns.set(snap.avg_latency_ns() as i64);
        *last = LastSynced {
            orders_received: snap.orders_received,
            orders_accepted: snap.orders_accepted,
            orders_rejected: snap.orders_rejected,
            reports_published: snap.reports_published,
            fills_published: snap.fills_published,
            pool_exhausted: snap.pool_exhausted,
            queue_full: snap.queue_full,
        };
    }

    fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf).context("failed to encode metrics")?;
        String::from_utf8(buf).context("metrics output was not valid utf-8")
    }
}

/// Running total of each monotonic counter as of the last scrape, so
/// [`GatewayMetrics::sync_from_stats`] can advance by delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastSynced {
    orders_received: u64,
    orders_accepted: u64,
    orders_rejected: u64,
    reports_published: u64,
    fills_published: u64,
    pool_exhausted: u64,
    queue_full: u64,
}

/// Serve `/metrics` and `/healthz` until the process exits. Intended to
/// be spawned on the small Tokio runtime `flowgate-bin` owns for ambient
/// HTTP concerns, never on `T_ingress`/`T_publish`.
pub async fn serve(addr: SocketAddr, metrics: Arc<GatewayMetrics>, stats: Arc<Stats>) -> Result<()> {
    let listener = TcpListener::bind(addr).await.context("failed to bind metrics listener")?;
    info!(%addr, "metrics server listening");

    let last = Arc::new(tokio::sync::Mutex::new(LastSynced::default()));

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "failed to accept metrics connection");
                continue;
            }
        };
        let metrics = Arc::clone(&metrics);
        let stats = Arc::clone(&stats);
        let last = Arc::clone(&last);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let metrics = Arc::clone(&metrics);
                let stats = Arc::clone(&stats);
                let last = Arc::clone(&last);
                async move { handle_request(req, metrics, stats, last).await }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, error = %e, "metrics connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics: Arc<GatewayMetrics>,
    stats: Arc<Stats>,
    last: Arc<tokio::sync::Mutex<LastSynced>>,
) -> Result<Response<Full<Bytes>>, std::convert::Infallible> {
    match req.uri().path() {
        "/healthz" => Ok(Response::builder().status(StatusCode::OK).body(Full::new(Bytes::from("ok"))).unwrap()),
        "/metrics" => {
            let mut last = last.lock().await;
            metrics.sync_from_stats(&stats, &mut last);
            match metrics.encode() {
                Ok(body) => Ok(Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "text/plain; version=0.0.4")
                    .body(Full::new(Bytes::from(body)))
                    .unwrap()),
                Err(e) => {
                    error!(error = %e, "failed to encode metrics");
                    Ok(Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR).body(Full::new(Bytes::new())).unwrap())
                }
            }
        }
        _ => Ok(Response::builder().status(StatusCode::NOT_FOUND).body(Full::new(Bytes::from("not found"))).unwrap()),
    }
}
