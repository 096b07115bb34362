//! Storage layer on top of SQLite.
//!
//! ## Layout
//!
//! - [`db`]: store sessions (`Db`), opened per routine and closed on drop
//! - [`migrations`]: schema version 1 and the recreate-on-mismatch policy
//! - [`task_storage`]: duplicated layout, private child copies per parent
//! - [`task_storage_with_key`]: normalized layout, one keyed child shared by reference
//! - [`records`]: layout-agnostic counts, clears and fetches
//!
//! ```rust,no_run
//! use dupnorm::db::{db::Db, records::Records};
//! use dupnorm::libs::layout::Layout;
//!
//! let db = Db::open(std::path::Path::new("dupnorm.db"))?;
//! let parents = Records::new(&db.conn, Layout::Normalized).count_tasks()?;
//! # Ok::<(), dupnorm::libs::error::DemoError>(())
//! ```

pub mod db;
pub mod migrations;
pub mod records;
pub mod task_storage;
pub mod task_storage_with_key;
