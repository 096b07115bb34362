//! Bounded, shared routine log.
//!
//! Every routine line is appended here and emitted once: printed when the
//! buffer echoes, otherwise as a `tracing` event under the `dupnorm` target.
//! The buffer keeps the most recent [`LOG_CAPACITY`] entries and evicts the
//! oldest first; the console's log panel reads it newest first.

use crate::libs::messages::Message;
use crate::msg_print;
use chrono::Local;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp, self.text)
    }
}

/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
    echo: bool,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        LogBuffer {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity + 1))),
            capacity,
            echo: false,
        }
    }

    /// Also prints every line as it is appended (one-shot CLI mode).
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn log(&self, message: Message) {
        self.log_text(message.to_string());
    }

    pub fn log_all(&self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.log(message);
        }
    }

    pub fn log_text(&self, text: String) {
        let entry = LogEntry {
            timestamp: Local::now().timestamp_millis(),
            text,
        };
        if self.echo {
            msg_print!(entry);
        } else {
            tracing::info!(target: "dupnorm", "{}", entry.text);
        }

        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entries newest first.
    pub fn recent(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().rev().cloned().collect()
    }

    /// Plain texts, newest first.
    pub fn texts(&self) -> Vec<String> {
        self.entries.lock().iter().rev().map(|e| e.text.clone()).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.text.contains(needle))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}
