//! # dupnorm - duplicated vs normalized object graph memory test
//!
//! Populates an SQLite store with the same task graph in two layouts and
//! compares the memory cost of materializing each one:
//!
//! - **Duplicated**: every task owns its own field-identical image title rows
//! - **Normalized**: every task references one shared, keyed image title
//!
//! Retrieval runs repeatedly, in batches, or on the calling thread, with heap
//! reports after each phase. A change watcher re-materializes the whole set
//! whenever another connection commits.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dupnorm::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;
