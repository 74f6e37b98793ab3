//! Execution journal: a best-effort, append-only JSONL crash-aid log,
//! not a persistence layer. Written off the hot path by a dedicated
//! writer thread fed through a bounded channel — a slow disk must never
//! stall `T_ingress`, so a full buffer drops the event and logs instead
//! of blocking.

use crate::model::{ExecutionReport, Fill};
use crossbeam::channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use tracing::{error, info};

/// Journal buffer depth; deliberately small since this is a crash aid,
/// not a queue anyone waits on.
const JOURNAL_CHANNEL_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum JournalEvent {
    Accepted(ExecutionReport),
    Rejected(ExecutionReport),
    Canceled(ExecutionReport),
    Replaced(ExecutionReport),
    Fill(Fill),
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    ts_ns: u64,
    #[serde(flatten)]
    event: JournalEvent,
}

pub struct AsyncJournal {
    sender: Option<Sender<JournalEvent>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AsyncJournal {
    pub fn open(path: PathBuf) -> std::io::Result<Self> {
        let (sender, receiver) = bounded(JOURNAL_CHANNEL_CAPACITY);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let handle = thread::spawn(move || Self::writer_loop(file, receiver));
        Ok(Self { sender: Some(sender), handle: Some(handle) })
    }

    fn writer_loop(mut file: std::fs::File, receiver: Receiver<JournalEvent>) {
        for event in receiver {
            let entry = JournalEntry { ts_ns: current_ts_hint(&event), event };
            match serde_json::to_string(&entry) {
                Ok(line) => {
                    if let Err(e) = writeln!(file, "{line}") {
                        error!(error = %e, "failed to write journal entry");
                    }
                }
                Err(e) => error!(error = %e, "failed to serialize journal entry"),
            }
        }
        let _ = file.flush();
        info!("journal writer thread stopping");
    }

    /// Record an event. Non-blocking: a full buffer drops the event and
    /// logs a warning rather than stalling the caller.
    pub fn record(&self, event: JournalEvent) {
        if let Some(sender) = &self.sender {
            if sender.try_send(event).is_err() {
                tracing::warn!("journal buffer full, dropping entry");
            }
        }
    }
}

fn current_ts_hint(event: &JournalEvent) -> u64 {
    match event {
        JournalEvent::Accepted(r) | JournalEvent::Rejected(r) | JournalEvent::Canceled(r) | JournalEvent::Replaced(r) => r.ts_ns,
        JournalEvent::Fill(f) => f.ts_ns,
    }
}

impl Drop for AsyncJournal {
    fn drop(&mut self) {
        // Drop the sender first so the writer thread's channel iterator
        // ends and the join below doesn't wait forever.
        let _ = self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
