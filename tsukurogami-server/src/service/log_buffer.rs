//! Log buffer service
//!
//! Keeps the most recent log lines in memory so operators can read them over
//! `GET /logs`. The buffer is fed by a `tracing` fmt layer whose writer hands
//! each formatted event to a channel; a background task appends it, so a
//! request that logs never waits on the buffer's lock.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

/// Default number of lines kept
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Rolling, thread-safe buffer of log lines
///
/// Uses Arc<Mutex<VecDeque<String>>> for shared access across handlers.
/// Once `capacity` is reached the oldest line is dropped for each new one.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    /// Creates an empty buffer holding at most `capacity` lines
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A panic while holding the lock cannot leave a VecDeque half-written
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends one line, evicting the oldest when full
    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Appends every line of a formatted chunk
    pub fn push_chunk(&self, chunk: &str) {
        for line in chunk.lines().filter(|l| !l.is_empty()) {
            self.push(line);
        }
    }

    /// Buffered lines as one newline-terminated text block
    pub fn render(&self) -> String {
        let lines = self.lock();
        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Creates a writer for a `tracing` fmt layer and spawns the task that
    /// drains it into this buffer
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_writer(&self) -> LogWriter {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let buffer = self.clone();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                buffer.push_chunk(&String::from_utf8_lossy(&bytes));
            }
        });

        LogWriter { tx }
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Non-blocking writer that forwards formatted log output to a [`LogBuffer`]
#[derive(Debug, Clone)]
pub struct LogWriter {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Dropped silently once the drain task is gone (runtime shutdown)
        let _ = self.tx.send(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
