//! Ingress listener: accepts egress-symmetric length-prefixed connections
//! and feeds parsed [`ExecutionOrder`]s into the ring T_ingress drains.
//!
//! Mirrors `flowgate_core::publisher`'s framing (a 4-byte big-endian
//! length prefix per frame) and its accept-loop shape, but on the
//! opposite data direction: one frame in is one `ExecutionOrder`. Each
//! accepted connection gets its own blocking reader thread; all of them
//! push into the same ring, which `crossbeam::queue::ArrayQueue` already
//! makes safe for concurrent producers.

use flowgate_core::model::ExecutionOrder;
use flowgate_core::parser::OrderParser;
use flowgate_core::perf::queue::RingQueue;
use flowgate_core::stats::Stats;
use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Frames above this are rejected outright rather than allocated for —
/// well beyond any legitimate `ExecutionOrder` JSON encoding.
const MAX_FRAME_BYTES: u32 = 1 << 20;

fn read_frame(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    if let Err(e) = stream.read_exact(&mut len_buf) {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(e);
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "ingress frame exceeds maximum size"));
    }
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf)?;
    Ok(Some(buf))
}

pub struct IngressServer {
    local_addr: std::net::SocketAddr,
}

impl IngressServer {
    /// Bind `bind_addr` and spawn the accept loop. Returns once the
    /// listener is bound; the accept loop and every connection's reader
    /// thread run in the background until `running` is cleared.
    pub fn bind(
        bind_addr: &str,
        queue: RingQueue<ExecutionOrder>,
        parser: OrderParser,
        stats: Arc<Stats>,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr)?;
        let local_addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let parser = Arc::new(parser);
        std::thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, addr)) => {
                        info!(%addr, "ingress connection accepted");
                        let queue = queue.clone();
                        let parser = Arc::clone(&parser);
                        let stats = Arc::clone(&stats);
                        let running = Arc::clone(&running);
                        std::thread::spawn(move || read_loop(stream, queue, parser, stats, running));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(10));
                    }
                    Err(e) => {
                        warn!(error = %e, "ingress accept failed");
                        std::thread::sleep(Duration::from_millis(10));
                    }
                }
            }
        });

        Ok(Self { local_addr })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }
}

fn read_loop(
    mut stream: TcpStream,
    queue: RingQueue<ExecutionOrder>,
    parser: Arc<OrderParser>,
    stats: Arc<Stats>,
    running: Arc<AtomicBool>,
) {
    let _ = stream.set_nodelay(true);
    while running.load(Ordering::Relaxed) {
        match read_frame(&mut stream) {
            Ok(Some(bytes)) => match parser.parse(&bytes) {
                Some(order) => {
                    if let Err(order) = queue.push(order) {
                        stats.inc_queue_full();
                        parser.release(order);
                    }
                }
                None => stats.inc_pool_exhausted(),
            },
            Ok(None) => {
                debug!("ingress connection closed");
                return;
            }
            Err(e) => {
                warn!(error = %e, "ingress read failed, dropping connection");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_core::perf::pools::ObjectPool;
    use std::io::Write;
    use std::net::TcpStream as ClientStream;

    fn sample_json() -> &'static str {
        r#"{
            "version": 1, "cl_id": "A1", "action": "place",
            "venue_type": "cex", "venue": "bybit", "product_type": "spot",
            "ts_ns": 1000,
            "details": {"cex_order": {
                "symbol": "ETH/USDT", "side": "buy", "order_type": "limit",
                "time_in_force": "gtc", "size": "0.02", "price": "2500.0"
            }}
        }"#
    }

    #[test]
    fn accepted_connection_delivers_parsed_order_to_the_queue() {
        let queue = RingQueue::new(8);
        let running = Arc::new(AtomicBool::new(true));
        let server = IngressServer::bind(
            "127.0.0.1:0",
            queue.clone(),
            OrderParser::new(ObjectPool::new(4)),
            Arc::new(Stats::new()),
            Arc::clone(&running),
        )
        .unwrap();

        let mut client = loop {
            match ClientStream::connect(server.local_addr()) {
                Ok(s) => break s,
                Err(_) => std::thread::sleep(Duration::from_millis(5)),
            }
        };

        let payload = sample_json().as_bytes();
        client.write_all(&(payload.len() as u32).to_be_bytes()).unwrap();
        client.write_all(payload).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let order = loop {
            if let Some(order) = queue.pop() {
                break order;
            }
            assert!(std::time::Instant::now() < deadline, "order never arrived");
            std::thread::sleep(Duration::from_millis(10));
        };
        assert_eq!(order.cl_id, "A1");

        running.store(false, Ordering::Relaxed);
    }

    #[test]
    fn oversized_frame_prefix_drops_the_connection_without_allocating() {
        let queue = RingQueue::new(8);
        let running = Arc::new(AtomicBool::new(true));
        let server = IngressServer::bind(
            "127.0.0.1:0",
            queue.clone(),
            OrderParser::new(ObjectPool::new(4)),
            Arc::new(Stats::new()),
            Arc::clone(&running),
        )
        .unwrap();

        let mut client = loop {
            match ClientStream::connect(server.local_addr()) {
                Ok(s) => break s,
                Err(_) => std::thread::sleep(Duration::from_millis(5)),
            }
        };
        client.write_all(&(MAX_FRAME_BYTES + 1).to_be_bytes()).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        assert!(queue.pop().is_none());
        running.store(false, Ordering::Relaxed);
    }
}
