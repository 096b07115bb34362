//! Layout-agnostic access to the record tables.
//!
//! Routines talk to [`Records`] and pick the layout at runtime; the two
//! layout modules only know their own tables.

use super::migrations::record_tables;
use super::task_storage::TaskStorages;
use super::task_storage_with_key::TaskStorageWithKeys;
use crate::libs::error::Result;
use crate::libs::layout::Layout;
use crate::libs::memory::HeapGuard;
use crate::libs::task::StoredTask;
use rusqlite::Connection;

pub struct Records<'a> {
    conn: &'a Connection,
    layout: Layout,
}

impl<'a> Records<'a> {
    pub fn new(conn: &'a Connection, layout: Layout) -> Self {
        Records { conn, layout }
    }

    /// The layout that currently holds parents; duplicated wins when both do.
    pub fn detect(conn: &Connection) -> Result<Option<Layout>> {
        for layout in Layout::ALL {
            if Records::new(conn, layout).count_tasks()? > 0 {
                return Ok(Some(layout));
            }
        }
        Ok(None)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn count_tasks(&self) -> Result<u64> {
        self.count(self.layout.task_table())
    }

    pub fn count_image_titles(&self) -> Result<u64> {
        self.count(self.layout.image_titles_table())
    }

    /// Total child references held by all parents.
    pub fn count_links(&self) -> Result<u64> {
        self.count(self.layout.link_table())
    }

    fn count(&self, table: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Deletes every record of this layout.
    pub fn clear(&self) -> Result<()> {
        for table in record_tables(self.layout) {
            self.conn.execute(&format!("DELETE FROM {}", table), [])?;
        }
        Ok(())
    }

    pub fn fetch_all(&self, guard: &HeapGuard) -> Result<Vec<StoredTask>> {
        Ok(match self.layout {
            Layout::Duplicated => TaskStorages::new(self.conn)
                .fetch_all(guard)?
                .into_iter()
                .map(StoredTask::Duplicated)
                .collect(),
            Layout::Normalized => TaskStorageWithKeys::new(self.conn)
                .fetch_all(guard)?
                .into_iter()
                .map(StoredTask::Normalized)
                .collect(),
        })
    }

    pub fn fetch_range(&self, offset: usize, limit: usize, guard: &HeapGuard) -> Result<Vec<StoredTask>> {
        Ok(match self.layout {
            Layout::Duplicated => TaskStorages::new(self.conn)
                .fetch_range(offset, limit, guard)?
                .into_iter()
                .map(StoredTask::Duplicated)
                .collect(),
            Layout::Normalized => TaskStorageWithKeys::new(self.conn)
                .fetch_range(offset, limit, guard)?
                .into_iter()
                .map(StoredTask::Normalized)
                .collect(),
        })
    }
}
