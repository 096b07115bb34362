use super::migrations::MigrationManager;
use super::records::Records;
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::error::Result;
use crate::libs::layout::Layout;
use rusqlite::Connection;
use std::path::Path;

/// An open store session.
///
/// Each routine opens its own session and drops it when it finishes; the
/// underlying connection closes on drop. Sessions are never shared between
/// routines.
pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the store configured in `config.json`, in the default data directory.
    pub fn new() -> anyhow::Result<Db> {
        let config = Config::read()?;
        let db_file_path = DataStorage::new().get_path(config.database_file())?;
        Ok(Self::open(&db_file_path)?)
    }

    /// Opens (or creates) the store at `path` and brings its schema up to date.
    pub fn open(path: &Path) -> Result<Db> {
        let mut conn = Self::connect(path)?;
        MigrationManager::new().run_migrations(&mut conn)?;

        Ok(Db { conn })
    }

    /// Opens the store without touching the schema.
    pub fn new_without_migrations(path: &Path) -> Result<Connection> {
        Self::connect(path)
    }

    fn connect(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(conn)
    }

    /// Empties every record table of both layouts.
    pub fn clear_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for layout in Layout::ALL {
            Records::new(&tx, layout).clear()?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Counter that changes whenever another connection commits to the file.
    pub fn data_version(&self) -> Result<i64> {
        Ok(self.conn.query_row("PRAGMA data_version", [], |row| row.get(0))?)
    }

    /// Releases as much of this session's page cache as possible.
    pub fn shrink_memory(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA shrink_memory")?;
        Ok(())
    }
}
