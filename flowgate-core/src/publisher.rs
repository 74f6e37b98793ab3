//! Publisher (C11).
//!
//! Pops [`PublishMessage`]s off the SPSC queue and writes a two-frame
//! "topic, then JSON payload" message to every connected subscriber,
//! mirroring a pub/sub socket's wire shape. No `zmq`/`nng` crate appears
//! anywhere in the dependency stack this project draws from, so rather
//! than fabricate that dependency the framing is implemented directly
//! over `std::net::TcpStream`: each frame is a 4-byte big-endian length
//! prefix followed by its bytes, which is enough to recover message
//! boundaries on a raw stream.

use crate::model::PublishMessage;
use crate::perf::pools::ObjectPool;
use crate::perf::queue::RingQueue;
use crate::stats::Stats;
use parking_lot::Mutex;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Adaptive sleep profile applied when the publish queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepProfile {
    HighPerf,
    Normal,
    Eco,
}

impl SleepProfile {
    fn empty_queue_sleep(self) -> Duration {
        match self {
            SleepProfile::HighPerf => Duration::from_nanos(0),
            SleepProfile::Normal => Duration::from_micros(10),
            SleepProfile::Eco => Duration::from_micros(100),
        }
    }
}

fn write_frame(stream: &mut TcpStream, bytes: &[u8]) -> std::io::Result<()> {
    stream.write_all(&(bytes.len() as u32).to_be_bytes())?;
    stream.write_all(bytes)
}

struct Subscribers {
    streams: Vec<TcpStream>,
}

impl Subscribers {
    fn broadcast(&mut self, topic: &str, payload: &[u8]) {
        self.streams.retain_mut(|stream| {
            let ok = write_frame(stream, topic.as_bytes()).and_then(|_| write_frame(stream, payload));
            match ok {
                Ok(()) => true,
                Err(e) => {
                    debug!(error = %e, "dropping disconnected subscriber");
                    false
                }
            }
        });
    }
}

pub struct Publisher {
    queue: RingQueue<PublishMessage>,
    report_pool: ObjectPool<crate::model::ExecutionReport>,
    fill_pool: ObjectPool<crate::model::Fill>,
    subscribers: Arc<Mutex<Subscribers>>,
    stats: Arc<Stats>,
    profile: SleepProfile,
    running: Arc<AtomicBool>,
    local_addr: std::net::SocketAddr,
}

impl Publisher {
    pub fn new(
        bind_addr: &str,
        queue: RingQueue<PublishMessage>,
        report_pool: ObjectPool<crate::model::ExecutionReport>,
        fill_pool: ObjectPool<crate::model::Fill>,
        stats: Arc<Stats>,
        profile: SleepProfile,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr)?;
        let local_addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        let subscribers = Arc::new(Mutex::new(Subscribers { streams: Vec::new() }));
        let acceptor_subscribers = Arc::clone(&subscribers);
        let acceptor_running = Arc::clone(&running);
        std::thread::spawn(move || {
            while acceptor_running.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, addr)) => {
                        info!(%addr, "egress subscriber connected");
                        if stream.set_nodelay(true).is_ok() {
                            acceptor_subscribers.lock().streams.push(stream);
                        }
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(10));
                    }
                    Err(e) => {
                        warn!(error = %e, "egress accept failed");
                        std::thread::sleep(Duration::from_millis(10));
                    }
                }
            }
        });

        Ok(Self { queue, report_pool, fill_pool, subscribers, stats, profile, running, local_addr })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Run the publish loop until `running` is cleared. Intended to be
    /// the body of `T_publish`.
    pub fn run(&self) {
        while self.running.load(Ordering::Relaxed) {
            match self.queue.pop() {
                Some(msg) => self.publish_one(msg),
                None => {
                    let sleep = self.profile.empty_queue_sleep();
                    if !sleep.is_zero() {
                        std::thread::sleep(sleep);
                    }
                }
            }
        }
        self.drain_remaining();
    }

    /// Bounded best-effort drain on shutdown: drains the publish queue
    /// with a bounded grace period.
    fn drain_remaining(&self) {
        let deadline = std::time::Instant::now() + Duration::from_millis(500);
        while std::time::Instant::now() < deadline {
            match self.queue.pop() {
                Some(msg) => self.publish_one(msg),
                None => break,
            }
        }
    }

    fn publish_one(&self, msg: PublishMessage) {
        let topic = msg.topic();
        let serialized = match &msg {
            PublishMessage::Report(r) => serde_json::to_vec(r),
            PublishMessage::Fill(f) => serde_json::to_vec(f),
        };
        match serialized {
            Ok(payload) => {
                self.subscribers.lock().broadcast(topic, &payload);
                match &msg {
                    PublishMessage::Report(_) => self.stats.inc_reports_published(),
                    PublishMessage::Fill(_) => self.stats.inc_fills_published(),
                }
            }
            Err(e) => warn!(error = %e, topic, "failed to serialize publish message"),
        }
        self.release(msg);
    }

    fn release(&self, msg: PublishMessage) {
        match msg {
            PublishMessage::Report(r) => self.report_pool.release(r),
            PublishMessage::Fill(f) => self.fill_pool.release(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExecutionReport;
    use std::io::{BufReader, Read};
    use std::net::TcpStream as ClientStream;

    fn read_frame(reader: &mut impl Read) -> Vec<u8> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).unwrap();
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).unwrap();
        buf
    }

    #[test]
    fn publishes_report_as_two_frames_to_connected_subscriber() {
        let queue = RingQueue::new(8);
        let running = Arc::new(AtomicBool::new(true));
        let publisher = Publisher::new(
            "127.0.0.1:0",
            queue.clone(),
            ObjectPool::new(4),
            ObjectPool::new(4),
            Arc::new(Stats::new()),
            SleepProfile::HighPerf,
            Arc::clone(&running),
        )
        .unwrap();
        let addr = publisher.local_addr();

        let client = loop {
            match ClientStream::connect(addr) {
                Ok(s) => break s,
                Err(_) => std::thread::sleep(Duration::from_millis(5)),
            }
        };
        // give the acceptor thread a moment to register the subscriber
        std::thread::sleep(Duration::from_millis(50));

        let report = ExecutionReport::accepted("A1", None, 1, Default::default());
        queue.push(PublishMessage::Report(report)).unwrap();

        let publisher = Arc::new(publisher);
        let run_handle = {
            let publisher = Arc::clone(&publisher);
            std::thread::spawn(move || publisher.run())
        };

        let mut reader = BufReader::new(client);
        let topic = read_frame(&mut reader);
        let body = read_frame(&mut reader);
        assert_eq!(topic, b"exec.report");
        let decoded: ExecutionReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded.cl_id, "A1");

        running.store(false, Ordering::Relaxed);
        run_handle.join().unwrap();
    }
}
