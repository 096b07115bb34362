//! Single-slot routine runner.
//!
//! At most one routine runs at a time. Starting another while the slot is
//! occupied is rejected with [`DemoError::SlotBusy`] and changes nothing.
//! Cancellation is cooperative: routines poll their [`CancelToken`] between
//! iterations.

use crate::libs::error::{DemoError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Clears the running flag when dropped, panics included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct TaskSlot {
    running: Arc<AtomicBool>,
    cancel: CancelToken,
    handle: Option<JoinHandle<Result<()>>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        TaskSlot {
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancelToken::new(),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> Result<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| DemoError::SlotBusy)?;
        Ok(RunningGuard(Arc::clone(&self.running)))
    }

    /// Runs `routine` on the blocking pool. Must be called inside a tokio runtime.
    pub fn start<F>(&mut self, routine: F) -> Result<()>
    where
        F: FnOnce(CancelToken) -> Result<()> + Send + 'static,
    {
        let guard = self.acquire()?;
        self.cancel = CancelToken::new();
        let token = self.cancel.clone();

        self.handle = Some(tokio::task::spawn_blocking(move || {
            let _guard = guard;
            routine(token)
        }));
        Ok(())
    }

    /// Runs `routine` on the calling thread while holding the slot.
    pub fn run_inline<F, T>(&mut self, routine: F) -> Result<T>
    where
        F: FnOnce(CancelToken) -> Result<T>,
    {
        let _guard = self.acquire()?;
        self.cancel = CancelToken::new();
        routine(self.cancel.clone())
    }

    /// Waits for the started routine, if any, and returns its result.
    pub async fn wait(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }

    /// True once a started routine has returned (or nothing was started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Takes the result of a finished routine without blocking.
    pub async fn take_finished(&mut self) -> Option<Result<()>> {
        if self.handle.is_some() && self.is_finished() {
            Some(self.wait().await)
        } else {
            None
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Default for TaskSlot {
    fn default() -> Self {
        Self::new()
    }
}
