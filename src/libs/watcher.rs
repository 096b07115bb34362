//! Change-driven re-materialization.
//!
//! The watcher holds its own store session and polls SQLite's
//! `data_version`, which moves whenever another connection commits. Every
//! observed change reloads all parents of the watched layout and projects
//! them into domain objects, under the same out-of-memory policy as the
//! retrieval routines: the fault is logged and the watcher keeps going.
//! Failed store reads are logged the same way.
//!
//! The loop blocks its thread, so it belongs on the blocking pool.

use crate::db::db::Db;
use crate::db::records::Records;
use crate::libs::config::{MemoryConfig, MonitorConfig};
use crate::libs::error::Result;
use crate::libs::layout::Layout;
use crate::libs::log_buffer::LogBuffer;
use crate::libs::memory::{HeapGuard, MemorySnapshot};
use crate::libs::messages::Message;
use crate::libs::retrieve::materialize;
use crate::libs::runner::CancelToken;
use std::thread;
use std::time::Duration;

const SLEEP_SLICE: Duration = Duration::from_millis(20);

pub struct Watcher {
    db: Db,
    layout: Layout,
    config: MonitorConfig,
    memory: MemoryConfig,
    logs: LogBuffer,
    last_version: i64,
    deliveries: u64,
}

impl Watcher {
    /// Attaches to whichever layout has data, duplicated first.
    ///
    /// Returns `None` (after logging it) when the store is empty.
    pub fn new(db: Db, config: MonitorConfig, memory: MemoryConfig, logs: LogBuffer) -> Result<Option<Self>> {
        logs.log(Message::MonitoringStarted);
        logs.log_all(MemorySnapshot::capture(&memory).report("Before monitoring start"));

        let Some(layout) = Records::detect(&db.conn)? else {
            logs.log(Message::NoDataToMonitor);
            return Ok(None);
        };
        logs.log(Message::MonitoringLayout(layout));

        let last_version = db.data_version()?;
        Ok(Some(Watcher {
            db,
            layout,
            config,
            memory,
            logs,
            last_version,
            deliveries: 0,
        }))
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// How many result sets have been delivered so far, the initial one included.
    pub fn deliveries(&self) -> u64 {
        self.deliveries
    }

    /// Reloads and projects the current result set, logging the outcome.
    pub fn deliver(&mut self) -> Result<()> {
        let records = Records::new(&self.db.conn, self.layout);
        let count = records.count_tasks()?;
        self.deliveries += 1;
        self.logs.log(Message::ChangeDetected(count as usize));
        self.logs.log_all(MemorySnapshot::capture(&self.memory).report("After change detection"));

        let guard = HeapGuard::new(&self.memory);
        match records.fetch_all(&guard).and_then(|stored| materialize(&stored, &guard)) {
            Ok(tasks) => self.logs.log(Message::ConvertedTasks(tasks.len())),
            Err(error) if error.is_out_of_memory() => self.logs.log(Message::OutOfMemoryDuringConversion),
            Err(error) => self.logs.log(Message::FaultDuringConversion(error.to_string())),
        }
        Ok(())
    }

    /// Delivers once if another connection committed since the last check.
    pub fn poll(&mut self) -> Result<bool> {
        let version = self.db.data_version()?;
        if version == self.last_version {
            return Ok(false);
        }
        self.last_version = version;
        self.deliver()?;
        Ok(true)
    }

    /// One poll step that never ends the watcher: store faults are logged.
    pub fn tick(&mut self) -> bool {
        match self.poll() {
            Ok(delivered) => delivered,
            Err(error) => {
                self.logs.log(Message::MonitorReadFailed(error.to_string()));
                false
            }
        }
    }

    /// Initial delivery, then polls until `cancel` is raised.
    pub fn run(&mut self, cancel: CancelToken) {
        if let Err(error) = self.deliver() {
            self.logs.log(Message::MonitorReadFailed(error.to_string()));
        }

        let poll_interval = Duration::from_millis(self.config.poll_interval.max(1));
        while sleep_unless_cancelled(poll_interval, &cancel) {
            self.tick();
        }

        self.logs.log(Message::MonitorStopped);
    }
}

/// Sleeps in short slices; false once `cancel` is raised.
fn sleep_unless_cancelled(total: Duration, cancel: &CancelToken) -> bool {
    let mut left = total;
    while !left.is_zero() {
        if cancel.is_cancelled() {
            return false;
        }
        let slice = left.min(SLEEP_SLICE);
        thread::sleep(slice);
        left -= slice;
    }
    !cancel.is_cancelled()
}
