#[cfg(test)]
mod tests {
    use dupnorm::db::db::Db;
    use dupnorm::db::migrations::{get_db_version, needs_migration, MigrationManager, SCHEMA_VERSION};
    use dupnorm::db::records::Records;
    use dupnorm::libs::layout::Layout;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct MigrationTestContext {
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestContext for MigrationTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db_path = temp_dir.path().join("dupnorm.db");
            MigrationTestContext {
                _temp_dir: temp_dir,
                db_path,
            }
        }
    }

    fn user_version(conn: &rusqlite::Connection) -> u32 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap()
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_fresh_store_reaches_current_version(ctx: &mut MigrationTestContext) {
        let db = Db::open(&ctx.db_path).unwrap();

        assert_eq!(get_db_version(&db.conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(user_version(&db.conn), SCHEMA_VERSION);
        assert!(!needs_migration(&db.conn).unwrap());

        for layout in Layout::ALL {
            let records = Records::new(&db.conn, layout);
            assert_eq!(records.count_tasks().unwrap(), 0);
            assert_eq!(records.count_image_titles().unwrap(), 0);
            assert_eq!(records.count_links().unwrap(), 0);
        }
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migration_history(ctx: &mut MigrationTestContext) {
        let mut conn = Db::new_without_migrations(&ctx.db_path).unwrap();
        let manager = MigrationManager::new();

        manager.run_migrations(&mut conn).unwrap();

        let history = manager.get_migration_history(&conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, 1);
        assert_eq!(history[0].1, "create_record_tables");
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migration_idempotency(ctx: &mut MigrationTestContext) {
        let mut conn = Db::new_without_migrations(&ctx.db_path).unwrap();
        let manager = MigrationManager::new();

        manager.run_migrations(&mut conn).unwrap();
        let first = manager.get_migration_history(&conn).unwrap();
        manager.run_migrations(&mut conn).unwrap();
        let second = manager.get_migration_history(&conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(get_db_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_reopen_keeps_records(ctx: &mut MigrationTestContext) {
        {
            let db = Db::open(&ctx.db_path).unwrap();
            db.conn.execute("INSERT INTO task_storage_with_key (id) VALUES (1)", []).unwrap();
        }

        let db = Db::open(&ctx.db_path).unwrap();
        assert_eq!(Records::new(&db.conn, Layout::Normalized).count_tasks().unwrap(), 1);
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_unknown_version_recreates_store(ctx: &mut MigrationTestContext) {
        {
            let db = Db::open(&ctx.db_path).unwrap();
            db.conn.execute("INSERT INTO task_storage (id) VALUES (1)", []).unwrap();
            db.conn
                .execute("INSERT INTO migrations (version, name) VALUES (7, 'from_a_newer_build')", [])
                .unwrap();
            db.conn.execute_batch("CREATE TABLE leftover (id INTEGER)").unwrap();
        }

        let db = Db::open(&ctx.db_path).unwrap();

        assert_eq!(get_db_version(&db.conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(user_version(&db.conn), SCHEMA_VERSION);
        assert_eq!(Records::new(&db.conn, Layout::Duplicated).count_tasks().unwrap(), 0);

        let leftover: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE name = 'leftover'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(leftover, 0);
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_needs_migration_on_empty_file(ctx: &mut MigrationTestContext) {
        let mut conn = Db::new_without_migrations(&ctx.db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY,
                version INTEGER NOT NULL UNIQUE,
                name TEXT NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .unwrap();
        assert!(needs_migration(&conn).unwrap());

        MigrationManager::new().run_migrations(&mut conn).unwrap();
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_unreadable_history_is_an_error(ctx: &mut MigrationTestContext) {
        let mut conn = Db::new_without_migrations(&ctx.db_path).unwrap();
        assert!(get_db_version(&conn).is_err());
        assert!(needs_migration(&conn).is_err());

        conn.execute_batch("CREATE TABLE migrations (version TEXT, name TEXT, applied_at TEXT)")
            .unwrap();
        conn.execute("INSERT INTO migrations (version, name) VALUES ('not a number', 'broken')", [])
            .unwrap();
        assert!(get_db_version(&conn).is_err());
        assert!(MigrationManager::new().run_migrations(&mut conn).is_err());
    }
}
