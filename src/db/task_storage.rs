//! Duplicated layout: every parent owns private copies of its child records.

use crate::libs::error::Result;
use crate::libs::memory::HeapGuard;
use crate::libs::task::ImageTitlesFields;
use rusqlite::{params, Connection};

const INSERT_TASK: &str = "INSERT INTO task_storage (id) VALUES (?1)";
const INSERT_IMAGE_TITLES: &str = "INSERT INTO image_titles_storage (title, category, portal_category) VALUES (?1, ?2, ?3)";
const INSERT_LINK: &str = "INSERT INTO task_storage_image_titles (task_id, position, image_title_id) VALUES (?1, ?2, ?3)";
const SELECT_TASKS: &str = "SELECT t.id, c.id, c.title, c.category, c.portal_category
    FROM task_storage t
    LEFT JOIN task_storage_image_titles l ON l.task_id = t.id
    LEFT JOIN image_titles_storage c ON c.id = l.image_title_id";
const WHERE_RANGE: &str = "WHERE t.id IN (SELECT id FROM task_storage ORDER BY id LIMIT ?1 OFFSET ?2)";
const ORDER: &str = "ORDER BY t.id, l.position";

/// Rows are checked against the heap limit this often while loading.
const GUARD_STRIDE: usize = 1024;

/// Child record without identity beyond its row id.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTitlesStorage {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub portal_category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStorage {
    pub id: i64,
    pub image_titles: Vec<ImageTitlesStorage>,
}

impl ImageTitlesFields for ImageTitlesStorage {
    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn portal_category(&self) -> &str {
        &self.portal_category
    }
}

pub struct TaskStorages<'a> {
    conn: &'a Connection,
}

impl<'a> TaskStorages<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        TaskStorages { conn }
    }

    /// Inserts parent `id` with `fan_out` freshly created, field-identical children.
    pub fn insert_with_copies(&self, id: i64, content: &impl ImageTitlesFields, fan_out: u32) -> Result<()> {
        self.conn.prepare_cached(INSERT_TASK)?.execute(params![id])?;

        let mut insert_child = self.conn.prepare_cached(INSERT_IMAGE_TITLES)?;
        let mut insert_link = self.conn.prepare_cached(INSERT_LINK)?;
        for position in 0..fan_out {
            insert_child.execute(params![content.title(), content.category(), content.portal_category()])?;
            let child_id = self.conn.last_insert_rowid();
            insert_link.execute(params![id, position, child_id])?;
        }

        Ok(())
    }

    pub fn fetch_all(&self, guard: &HeapGuard) -> Result<Vec<TaskStorage>> {
        let sql = format!("{} {}", SELECT_TASKS, ORDER);
        self.fetch(&sql, params![], guard)
    }

    /// Parents `offset..offset + limit` in id order.
    pub fn fetch_range(&self, offset: usize, limit: usize, guard: &HeapGuard) -> Result<Vec<TaskStorage>> {
        let sql = format!("{} {} {}", SELECT_TASKS, WHERE_RANGE, ORDER);
        self.fetch(&sql, params![limit as i64, offset as i64], guard)
    }

    fn fetch(&self, sql: &str, params: impl rusqlite::Params, guard: &HeapGuard) -> Result<Vec<TaskStorage>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        let mut tasks: Vec<TaskStorage> = Vec::new();
        let mut seen = 0usize;
        while let Some(row) = rows.next()? {
            seen += 1;
            if seen % GUARD_STRIDE == 0 {
                guard.check()?;
            }

            let task_id: i64 = row.get(0)?;
            if tasks.last().map(|t| t.id) != Some(task_id) {
                guard.reserve(&mut tasks, 1)?;
                tasks.push(TaskStorage {
                    id: task_id,
                    image_titles: Vec::new(),
                });
            }

            let child_id: Option<i64> = row.get(1)?;
            if let (Some(child_id), Some(task)) = (child_id, tasks.last_mut()) {
                task.image_titles.push(ImageTitlesStorage {
                    id: child_id,
                    title: row.get(2)?,
                    category: row.get(3)?,
                    portal_category: row.get(4)?,
                });
            }
        }

        Ok(tasks)
    }
}
