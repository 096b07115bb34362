#[cfg(test)]
mod tests {
    use dupnorm::libs::config::{Config, GenerateConfig, MemoryConfig, RetrievalConfig, CONFIG_FILE_NAME, DB_FILE_NAME};
    use dupnorm::libs::data_storage::{DataStorage, DATA_DIR_ENV};
    use std::fs;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ConfigTestContext {
        temp_dir: TempDir,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            ConfigTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_missing_file_gives_defaults(ctx: &mut ConfigTestContext) {
        let config = Config::read_from(&ctx.temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();

        assert_eq!(config.database_file(), DB_FILE_NAME);
        assert_eq!(config.generate().count, 10_000);
        assert_eq!(config.generate().duplicate_fan_out, 50);
        assert_eq!(config.generate().normalized_fan_out, 5);
        assert_eq!(config.retrieval().iterations, 10);
        assert_eq!(config.retrieval().batch_size, 100);
        assert_eq!(config.monitor().poll_interval, 500);
        assert_eq!(config.memory().heap_limit_mb, 512);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_and_read_back(ctx: &mut ConfigTestContext) {
        let path = ctx.temp_dir.path().join(CONFIG_FILE_NAME);
        let config = Config {
            database: Some("other.db".to_string()),
            generate: Some(GenerateConfig {
                count: 42,
                ..GenerateConfig::default()
            }),
            memory: Some(MemoryConfig {
                heap_limit_mb: 64,
                low_memory_percent: 5,
            }),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let read = Config::read_from(&path).unwrap();
        assert_eq!(read.database_file(), "other.db");
        assert_eq!(read.generate().count, 42);
        assert_eq!(read.memory().heap_limit_mb, 64);
        assert_eq!(read.retrieval(), RetrievalConfig::default());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_absent_sections_are_not_written(ctx: &mut ConfigTestContext) {
        let path = ctx.temp_dir.path().join(CONFIG_FILE_NAME);
        Config::default().save_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), "{}");
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_partial_file_keeps_other_defaults(ctx: &mut ConfigTestContext) {
        let path = ctx.temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "monitor": { "poll_interval": 25 } }"#).unwrap();

        let config = Config::read_from(&path).unwrap();
        assert_eq!(config.monitor().poll_interval, 25);
        assert_eq!(config.generate(), GenerateConfig::default());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_malformed_file_is_an_error(ctx: &mut ConfigTestContext) {
        let path = ctx.temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::read_from(&path).is_err());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_data_dir_override(ctx: &mut ConfigTestContext) {
        let dir = ctx.temp_dir.path().join("data");
        std::env::set_var(DATA_DIR_ENV, &dir);

        let path = DataStorage::new().get_path(CONFIG_FILE_NAME).unwrap();
        assert_eq!(path, dir.join(CONFIG_FILE_NAME));
        assert!(dir.exists());

        std::env::remove_var(DATA_DIR_ENV);
    }
}
