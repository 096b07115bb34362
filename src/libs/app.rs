//! Orchestration surface shared by the one-shot commands and the console.
//!
//! `App` owns the configuration, the shared log buffer, the single routine
//! slot and the optional change monitor. Each triggered action opens its own
//! store session inside the routine and drops it when the routine ends.

use crate::db::db::Db;
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::error::{DemoError, Result};
use crate::libs::layout::Layout;
use crate::libs::log_buffer::LogBuffer;
use crate::libs::memory::show_memory_usage;
use crate::libs::messages::Message;
use crate::libs::populate::{populate, PopulatePlan};
use crate::libs::retrieve::{retrieve_all, retrieve_in_batches, retrieve_on_current_thread, RetrievalContext};
use crate::libs::runner::{CancelToken, TaskSlot};
use crate::libs::watcher::Watcher;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// The seven trigger actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate(Layout),
    Monitor,
    Retrieve,
    Batches,
    RetrieveMain,
    Memory,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Generate(Layout::Duplicated),
        Action::Generate(Layout::Normalized),
        Action::Monitor,
        Action::Retrieve,
        Action::Batches,
        Action::RetrieveMain,
        Action::Memory,
    ];

    /// Runs on the blocking pool and reports through `take_finished`.
    pub fn is_background(self) -> bool {
        matches!(self, Action::Generate(_) | Action::Retrieve | Action::Batches)
    }

    pub fn label(self) -> Message {
        match self {
            Action::Generate(Layout::Duplicated) => Message::ConsoleActionGenerateDuplicate,
            Action::Generate(Layout::Normalized) => Message::ConsoleActionGenerateNormalized,
            Action::Monitor => Message::ConsoleActionMonitor,
            Action::Retrieve => Message::ConsoleActionRetrieve,
            Action::Batches => Message::ConsoleActionBatches,
            Action::RetrieveMain => Message::ConsoleActionRetrieveMain,
            Action::Memory => Message::ConsoleActionMemory,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

struct MonitorHandle {
    cancel: CancelToken,
    handle: JoinHandle<Result<()>>,
}

pub struct App {
    config: Config,
    db_path: PathBuf,
    logs: LogBuffer,
    slot: TaskSlot,
    monitor: Option<MonitorHandle>,
}

impl App {
    pub fn new(config: Config, db_path: PathBuf, logs: LogBuffer) -> Self {
        App {
            config,
            db_path,
            logs,
            slot: TaskSlot::new(),
            monitor: None,
        }
    }

    /// Configuration and store location from the data directory.
    pub fn from_data_storage(logs: LogBuffer) -> anyhow::Result<Self> {
        let config = Config::read()?;
        let db_path = DataStorage::new().get_path(config.database_file())?;
        Ok(Self::new(config, db_path, logs))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn open_db(&self) -> Result<Db> {
        Db::open(&self.db_path)
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.as_ref().map(|m| !m.handle.is_finished()).unwrap_or(false)
    }

    /// Opens the store once, optionally emptying every record table.
    pub fn init_store(&self, clear: bool) -> Result<()> {
        let mut db = self.open_db()?;
        if clear {
            self.logs.log(Message::ClearingAllData);
            db.clear_all()?;
            self.logs.log(Message::AllDataCleared);
        }
        self.logs.log(Message::StoreInitialized);
        Ok(())
    }

    fn retrieval_context(&self, cancel: CancelToken) -> RetrievalContext {
        RetrievalContext::new(self.config.retrieval(), self.config.memory(), self.logs.clone(), cancel)
    }

    /// Starts `action`. Background actions return immediately; the
    /// foreground variant and the memory report run to completion first.
    /// Rejected with `SlotBusy` while another routine runs.
    pub fn trigger(&mut self, action: Action) -> Result<()> {
        if self.slot.is_running() {
            return Err(DemoError::SlotBusy);
        }

        match action {
            Action::Generate(layout) => {
                let plan = PopulatePlan::from_config(layout, &self.config.generate());
                self.start_populate(plan)
            }
            Action::Monitor => self.start_monitor(),
            Action::Retrieve => {
                let ctx = self.retrieval_context(CancelToken::new());
                let path = self.db_path.clone();
                self.slot.start(move |cancel| {
                    let db = Db::open(&path)?;
                    retrieve_all(&db, &RetrievalContext { cancel, ..ctx }).map(|_| ())
                })
            }
            Action::Batches => {
                let ctx = self.retrieval_context(CancelToken::new());
                let path = self.db_path.clone();
                self.slot.start(move |cancel| {
                    let db = Db::open(&path)?;
                    retrieve_in_batches(&db, &RetrievalContext { cancel, ..ctx }).map(|_| ())
                })
            }
            Action::RetrieveMain => {
                let ctx = self.retrieval_context(CancelToken::new());
                let path = self.db_path.clone();
                self.slot.run_inline(move |cancel| {
                    let db = Db::open(&path)?;
                    retrieve_on_current_thread(&db, &RetrievalContext { cancel, ..ctx }).map(|_| ())
                })
            }
            Action::Memory => {
                let memory = self.config.memory();
                let pause = Duration::from_millis(self.config.retrieval().collection_pause_ms);
                let logs = self.logs.clone();
                self.slot.run_inline(move |_| {
                    show_memory_usage(&memory, &logs, pause);
                    Ok(())
                })
            }
        }
    }

    /// Starts a population run with an explicit plan.
    pub fn start_populate(&mut self, plan: PopulatePlan) -> Result<()> {
        let memory = self.config.memory();
        let logs = self.logs.clone();
        let path = self.db_path.clone();
        self.slot.start(move |_| {
            let mut db = Db::open(&path)?;
            populate(&mut db, &plan, &memory, &logs).map(|_| ())
        })
    }

    /// Replaces any running monitor with a fresh one.
    pub fn start_monitor(&mut self) -> Result<()> {
        self.stop_monitor();

        let db = self.open_db()?;
        let monitor = self.config.monitor();
        let memory = self.config.memory();
        let logs = self.logs.clone();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            if let Some(mut watcher) = Watcher::new(db, monitor, memory, logs)? {
                watcher.run(token);
            }
            Ok(())
        });
        self.monitor = Some(MonitorHandle { cancel, handle });
        Ok(())
    }

    pub fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.cancel.cancel();
        }
    }

    /// Waits for the monitor task to end; `None` when none was started.
    pub async fn wait_monitor(&mut self) -> Option<Result<()>> {
        let monitor = self.monitor.take()?;
        Some(match monitor.handle.await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        })
    }

    /// Waits for the running background routine, if any.
    pub async fn wait(&mut self) -> Result<()> {
        self.slot.wait().await
    }

    /// Result of a background routine that already finished, if any.
    pub async fn take_finished(&mut self) -> Option<Result<()>> {
        self.slot.take_finished().await
    }

    pub fn cancel(&self) {
        self.slot.cancel();
    }

    /// Cancels everything and waits for it to wind down.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.slot.cancel();
        if let Some(monitor) = self.monitor.take() {
            monitor.cancel.cancel();
            let ended = match monitor.handle.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            };
            if let Err(e) = ended {
                self.logs.log(Message::MonitorError(e.to_string()));
            }
        }
        self.slot.wait().await
    }
}
