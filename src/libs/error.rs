//! Error types shared by the store, the routines and the task slot.
//!
//! Routines only ever distinguish two fault kinds when they decide to stop
//! iterating: [`DemoError::OutOfMemory`] and everything else. The remaining
//! variants exist so callers get a readable reason.

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("out of memory: {requested} bytes requested with {limit} bytes heap limit")]
    OutOfMemory { requested: usize, limit: usize },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("allocator control failed: {0}")]
    Allocator(String),

    #[error("a routine is already running")]
    SlotBusy,

    #[error("routine cancelled")]
    Cancelled,

    #[error("fan-out must be greater than zero")]
    InvalidFanOut,

    #[error("background task failed: {0}")]
    Join(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl DemoError {
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, DemoError::OutOfMemory { .. })
    }
}

impl From<TryReserveError> for DemoError {
    fn from(_: TryReserveError) -> Self {
        // The reservation size is not exposed by the std error.
        DemoError::OutOfMemory { requested: 0, limit: 0 }
    }
}

impl From<tokio::task::JoinError> for DemoError {
    fn from(err: tokio::task::JoinError) -> Self {
        DemoError::Join(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DemoError>;
