//! Schema versioning for the record store.
//!
//! The store follows a "delete if migration needed" policy: a fresh file gets
//! every registered migration applied in order, a file that is already current
//! is left alone, and a file whose recorded history does not match the
//! registry (an unknown future version or a renamed migration) is wiped and
//! rebuilt from scratch. The record tables only ever hold generated demo data,
//! so dropping them is always safe.
//!
//! ```rust,no_run
//! use dupnorm::db::migrations::{get_db_version, MigrationManager};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open("dupnorm.db")?;
//! MigrationManager::new().run_migrations(&mut conn)?;
//! assert_eq!(get_db_version(&conn)?, 1);
//! # Ok::<(), dupnorm::libs::error::DemoError>(())
//! ```

use crate::libs::error::Result;
use crate::libs::layout::Layout;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_warning};
use rusqlite::{params, Connection, Transaction};

/// Schema version written by the latest registered migration.
pub const SCHEMA_VERSION: u32 = 1;

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> rusqlite::Result<()>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: both storage layouts.
        // Link tables keep the per-parent order of child references.
        self.add_migration(1, "create_record_tables", |tx| {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS task_storage (
                    id INTEGER NOT NULL PRIMARY KEY
                );
                CREATE TABLE IF NOT EXISTS image_titles_storage (
                    id INTEGER NOT NULL PRIMARY KEY,
                    title TEXT NOT NULL,
                    category TEXT NOT NULL,
                    portal_category TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS task_storage_image_titles (
                    task_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    image_title_id INTEGER NOT NULL,
                    PRIMARY KEY (task_id, position),
                    FOREIGN KEY (task_id) REFERENCES task_storage(id) ON DELETE CASCADE,
                    FOREIGN KEY (image_title_id) REFERENCES image_titles_storage(id) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS task_storage_with_key (
                    id INTEGER NOT NULL PRIMARY KEY
                );
                CREATE TABLE IF NOT EXISTS image_titles_storage_with_key (
                    id TEXT NOT NULL PRIMARY KEY,
                    title TEXT NOT NULL,
                    category TEXT NOT NULL,
                    portal_category TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS task_storage_with_key_image_titles (
                    task_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    image_title_id TEXT NOT NULL,
                    PRIMARY KEY (task_id, position),
                    FOREIGN KEY (task_id) REFERENCES task_storage_with_key(id) ON DELETE CASCADE,
                    FOREIGN KEY (image_title_id) REFERENCES image_titles_storage_with_key(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_task_storage_image_titles_child
                    ON task_storage_image_titles(image_title_id);",
            )
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> rusqlite::Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    /// Applies pending migrations, recreating the store when its history is
    /// not one this build knows about.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        if !self.history_matches(conn)? {
            let found = self.get_current_version(conn)?;
            msg_warning!(Message::SchemaRecreated {
                found,
                expected: self.latest_version(),
            });
            self.drop_all(conn)?;
            conn.execute(MIGRATIONS_TABLE, [])?;
        }

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!("Store schema is up to date");
            return Ok(());
        }

        let tx = conn.transaction()?;
        for migration in pending {
            (migration.up)(&tx)?;
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
            msg_debug!(Message::MigrationApplied {
                version: migration.version,
                name: migration.name,
            });
        }
        tx.pragma_update(None, "user_version", self.latest_version())?;
        tx.commit()?;

        Ok(())
    }

    /// True when every recorded migration is a known one with the same name.
    fn history_matches(&self, conn: &Connection) -> Result<bool> {
        for (version, name, _) in self.get_migration_history(conn)? {
            let known = self.migrations.iter().any(|m| m.version == version && m.name == name);
            if !known {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn drop_all(&self, conn: &mut Connection) -> Result<()> {
        let tables: Vec<String> = {
            let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let tx = conn.transaction()?;
        tx.execute_batch("PRAGMA defer_foreign_keys = ON")?;
        for table in tables {
            tx.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table), [])?;
        }
        tx.pragma_update(None, "user_version", 0)?;
        tx.commit()?;
        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;

        Ok(version.unwrap_or(0))
    }

    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;

        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(history)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    let current = manager.get_current_version(conn)?;
    Ok(current != manager.latest_version())
}

/// Tables that hold records of `layout`, in deletion order.
pub fn record_tables(layout: Layout) -> [&'static str; 3] {
    [layout.link_table(), layout.image_titles_table(), layout.task_table()]
}
