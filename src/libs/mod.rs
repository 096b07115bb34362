//! Core library modules for dupnorm.
//!
//! - **Infrastructure**: configuration, data storage, errors, messaging
//! - **Domain**: layouts, stored and projected task types
//! - **Routines**: population, retrieval, change watching, memory diagnostics
//! - **Orchestration**: the single routine slot, the shared log and [`app::App`]
//!
//! ```rust,no_run
//! use dupnorm::libs::app::{Action, App};
//! use dupnorm::libs::log_buffer::LogBuffer;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut app = App::from_data_storage(LogBuffer::new().echoing())?;
//! app.trigger(Action::Retrieve)?;
//! app.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod data_storage;
pub mod error;
pub mod layout;
pub mod log_buffer;
pub mod memory;
pub mod messages;
pub mod populate;
pub mod retrieve;
pub mod runner;
pub mod task;
pub mod watcher;
