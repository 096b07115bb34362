//! Normalized layout: children are keyed and shared by reference.
//!
//! Loading resolves references through a per-query identity map, so one
//! stored child becomes one in-memory record no matter how many parents
//! point at it.

use crate::libs::error::Result;
use crate::libs::memory::HeapGuard;
use crate::libs::task::ImageTitlesFields;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Arc;

const INSERT_TASK: &str = "INSERT INTO task_storage_with_key (id) VALUES (?1)";
const UPSERT_IMAGE_TITLES: &str = "INSERT INTO image_titles_storage_with_key (id, title, category, portal_category)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(id) DO UPDATE SET title = excluded.title, category = excluded.category, portal_category = excluded.portal_category";
const INSERT_LINK: &str = "INSERT INTO task_storage_with_key_image_titles (task_id, position, image_title_id) VALUES (?1, ?2, ?3)";
const SELECT_IMAGE_TITLES: &str = "SELECT id, title, category, portal_category FROM image_titles_storage_with_key WHERE id = ?1";
const SELECT_TASKS: &str = "SELECT t.id, l.image_title_id
    FROM task_storage_with_key t
    LEFT JOIN task_storage_with_key_image_titles l ON l.task_id = t.id";
const WHERE_RANGE: &str = "WHERE t.id IN (SELECT id FROM task_storage_with_key ORDER BY id LIMIT ?1 OFFSET ?2)";
const ORDER: &str = "ORDER BY t.id, l.position";

const GUARD_STRIDE: usize = 1024;

/// Child record identified by a string key.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTitlesStorageWithKey {
    pub id: String,
    pub title: String,
    pub category: String,
    pub portal_category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskStorageWithKey {
    pub id: i64,
    pub image_titles: Vec<Arc<ImageTitlesStorageWithKey>>,
}

impl ImageTitlesFields for ImageTitlesStorageWithKey {
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

pub struct TaskStorageWithKeys<'a> {
    conn: &'a Connection,
}

impl<'a> TaskStorageWithKeys<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        TaskStorageWithKeys { conn }
    }

    /// Creates the keyed child, or overwrites its fields if the key exists.
    pub fn upsert_image_titles(&self, key: &str, content: &impl ImageTitlesFields) -> Result<()> {
        self.conn
            .prepare_cached(UPSERT_IMAGE_TITLES)?
            .execute(params![key, content.title(), content.category(), content.portal_category()])?;
        Ok(())
    }

    /// Inserts parent `id` holding `fan_out` references to the child `key`.
    pub fn insert_with_references(&self, id: i64, key: &str, fan_out: u32) -> Result<()> {
        self.conn.prepare_cached(INSERT_TASK)?.execute(params![id])?;

        let mut insert_link = self.conn.prepare_cached(INSERT_LINK)?;
        for position in 0..fan_out {
            insert_link.execute(params![id, position, key])?;
        }

        Ok(())
    }

    pub fn fetch_all(&self, guard: &HeapGuard) -> Result<Vec<TaskStorageWithKey>> {
        let sql = format!("{} {}", SELECT_TASKS, ORDER);
        self.fetch(&sql, params![], guard)
    }

    pub fn fetch_range(&self, offset: usize, limit: usize, guard: &HeapGuard) -> Result<Vec<TaskStorageWithKey>> {
        let sql = format!("{} {} {}", SELECT_TASKS, WHERE_RANGE, ORDER);
        self.fetch(&sql, params![limit as i64, offset as i64], guard)
    }

    fn fetch(&self, sql: &str, params: impl rusqlite::Params, guard: &HeapGuard) -> Result<Vec<TaskStorageWithKey>> {
        let mut identity_map: HashMap<String, Arc<ImageTitlesStorageWithKey>> = HashMap::new();
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        let mut tasks: Vec<TaskStorageWithKey> = Vec::new();
        let mut seen = 0usize;
        while let Some(row) = rows.next()? {
            seen += 1;
            if seen % GUARD_STRIDE == 0 {
                guard.check()?;
            }

            let task_id: i64 = row.get(0)?;
            if tasks.last().map(|t| t.id) != Some(task_id) {
                guard.reserve(&mut tasks, 1)?;
                tasks.push(TaskStorageWithKey {
                    id: task_id,
                    image_titles: Vec::new(),
                });
            }

            let key: Option<String> = row.get(1)?;
            let Some(key) = key else { continue };
            let image_titles = match identity_map.get(&key) {
                Some(shared) => Arc::clone(shared),
                None => match self.find_image_titles(&key)? {
                    Some(loaded) => {
                        let loaded = Arc::new(loaded);
                        identity_map.insert(key, Arc::clone(&loaded));
                        loaded
                    }
                    // Dangling reference; foreign keys normally prevent this.
                    None => continue,
                },
            };
            if let Some(task) = tasks.last_mut() {
                task.image_titles.push(image_titles);
            }
        }

        Ok(tasks)
    }

    pub fn find_image_titles(&self, key: &str) -> Result<Option<ImageTitlesStorageWithKey>> {
        let found = self
            .conn
            .prepare_cached(SELECT_IMAGE_TITLES)?
            .query_row(params![key], |row| {
                Ok(ImageTitlesStorageWithKey {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    category: row.get(2)?,
                    portal_category: row.get(3)?,
                })
            })
            .optional()?;
        Ok(found)
    }
}
