//! Optional append-only event log for diagnosing prompt detection.
//!
//! Events are handed to a background writer thread over a bounded channel
//! and written as JSON lines. Sends never block: when the channel is full
//! the event is dropped. Nothing flows back to the caller.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

const LOG_CHANNEL_SIZE: usize = 512;

/// Something notable that happened in the proxy loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DebugEvent {
    SessionStart {
        command: Vec<String>,
    },
    SessionEnd {
        reason: String,
        exit_code: Option<u32>,
    },
    /// Bytes typed by the user, before toggle interception.
    Input {
        raw: String,
    },
    /// A chunk of child output, as read and as normalized.
    Output {
        raw: String,
        clean: String,
    },
    /// A match attempt against the recent lines of the window.
    Evaluation {
        tail: String,
        matched: bool,
    },
    Matched {
        pattern_index: usize,
        pattern: String,
        matched: String,
        response: String,
    },
    /// Bytes injected into the child after the settle delay.
    Response {
        bytes: String,
    },
    Status {
        message: String,
    },
}

#[derive(Debug, Serialize)]
struct Record {
    ts: String,
    elapsed_ms: u64,
    #[serde(flatten)]
    event: DebugEvent,
}

pub struct DebugLog {
    sender: Option<SyncSender<Record>>,
    writer: Option<JoinHandle<()>>,
    started: Instant,
}

impl DebugLog {
    /// A sink that records nothing.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            writer: None,
            started: Instant::now(),
        }
    }

    /// Append events to `path`, creating parent directories as needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = sync_channel(LOG_CHANNEL_SIZE);
        let writer = std::thread::Builder::new()
            .name("debug-log".to_string())
            .spawn(move || writer_loop(receiver, file))?;
        Ok(Self {
            sender: Some(sender),
            writer: Some(writer),
            started: Instant::now(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn record(&self, event: DebugEvent) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        let record = Record {
            ts: format_timestamp(SystemTime::now()),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            event,
        };
        let _ = sender.try_send(record);
    }

    /// Stop accepting events and wait until queued ones are written.
    pub fn close(&mut self) {
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

impl Drop for DebugLog {
    fn drop(&mut self) {
        self.close();
    }
}

fn writer_loop(receiver: Receiver<Record>, file: File) {
    let mut out = BufWriter::new(file);
    while let Ok(record) = receiver.recv() {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode debug record");
                continue;
            }
        };
        if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
            break;
        }
    }
}

fn format_timestamp(timestamp: SystemTime) -> String {
    let duration = timestamp.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}
