#[cfg(test)]
mod tests {
    use dupnorm::db::db::Db;
    use dupnorm::db::records::Records;
    use dupnorm::db::task_storage_with_key::TaskStorageWithKeys;
    use dupnorm::libs::config::{GenerateConfig, MemoryConfig};
    use dupnorm::libs::error::DemoError;
    use dupnorm::libs::layout::Layout;
    use dupnorm::libs::log_buffer::LogBuffer;
    use dupnorm::libs::populate::{populate, PopulatePlan, SHARED_IMAGE_TITLES_KEY};
    use dupnorm::libs::task::ImageTitlesFields;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct PopulateTestContext {
        _temp_dir: TempDir,
        db: Db,
        logs: LogBuffer,
    }

    impl TestContext for PopulateTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(&temp_dir.path().join("dupnorm.db")).unwrap();
            PopulateTestContext {
                _temp_dir: temp_dir,
                db,
                logs: LogBuffer::new(),
            }
        }
    }

    fn plan(layout: Layout, count: u64, fan_out: u32) -> PopulatePlan {
        PopulatePlan {
            layout,
            count,
            fan_out,
            progress_every: 1_000,
        }
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_duplicated_population_creates_private_copies(ctx: &mut PopulateTestContext) {
        let plan = plan(Layout::Duplicated, 10_000, 50);
        let outcome = populate(&mut ctx.db, &plan, &MemoryConfig::default(), &ctx.logs).unwrap();

        assert_eq!(outcome.tasks, 10_000);
        assert_eq!(outcome.image_titles, 500_000);
        assert_eq!(outcome.image_titles, plan.expected_image_titles());

        let records = Records::new(&ctx.db.conn, Layout::Duplicated);
        assert_eq!(records.count_tasks().unwrap(), 10_000);
        assert_eq!(records.count_image_titles().unwrap(), 500_000);
        assert_eq!(records.count_links().unwrap(), 500_000);

        assert!(ctx.logs.contains("Total ImageTitlesStorage objects: 500000"));
        assert!(ctx.logs.contains("Total TaskStorage objects: 10000"));
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_normalized_population_shares_one_child(ctx: &mut PopulateTestContext) {
        let plan = plan(Layout::Normalized, 10_000, 5);
        let outcome = populate(&mut ctx.db, &plan, &MemoryConfig::default(), &ctx.logs).unwrap();

        assert_eq!(outcome.tasks, 10_000);
        assert_eq!(outcome.image_titles, 1);

        let records = Records::new(&ctx.db.conn, Layout::Normalized);
        assert_eq!(records.count_links().unwrap(), 50_000);

        let shared = TaskStorageWithKeys::new(&ctx.db.conn)
            .find_image_titles(SHARED_IMAGE_TITLES_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(shared.title(), "リビング");
        assert_eq!(shared.category(), "Inside");
        assert_eq!(shared.portal_category(), "LivingDining");
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_population_replaces_previous_run(ctx: &mut PopulateTestContext) {
        let memory = MemoryConfig::default();
        populate(&mut ctx.db, &plan(Layout::Duplicated, 20, 3), &memory, &ctx.logs).unwrap();
        let outcome = populate(&mut ctx.db, &plan(Layout::Duplicated, 10, 2), &memory, &ctx.logs).unwrap();

        assert_eq!(outcome.tasks, 10);
        assert_eq!(outcome.image_titles, 20);
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_layouts_are_independent(ctx: &mut PopulateTestContext) {
        let memory = MemoryConfig::default();
        populate(&mut ctx.db, &plan(Layout::Duplicated, 5, 2), &memory, &ctx.logs).unwrap();
        populate(&mut ctx.db, &plan(Layout::Normalized, 7, 2), &memory, &ctx.logs).unwrap();

        assert_eq!(Records::new(&ctx.db.conn, Layout::Duplicated).count_tasks().unwrap(), 5);
        assert_eq!(Records::new(&ctx.db.conn, Layout::Normalized).count_tasks().unwrap(), 7);

        ctx.db.clear_all().unwrap();
        assert_eq!(Records::detect(&ctx.db.conn).unwrap(), None);
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_zero_fan_out_is_rejected(ctx: &mut PopulateTestContext) {
        let result = populate(&mut ctx.db, &plan(Layout::Duplicated, 10, 0), &MemoryConfig::default(), &ctx.logs);

        assert!(matches!(result, Err(DemoError::InvalidFanOut)));
        assert!(ctx.logs.is_empty());
        assert_eq!(Records::new(&ctx.db.conn, Layout::Duplicated).count_tasks().unwrap(), 0);
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_empty_population_creates_nothing(ctx: &mut PopulateTestContext) {
        let outcome = populate(&mut ctx.db, &plan(Layout::Normalized, 0, 5), &MemoryConfig::default(), &ctx.logs).unwrap();

        assert_eq!(outcome.tasks, 0);
        assert_eq!(outcome.image_titles, 0);
    }

    #[test_context(PopulateTestContext)]
    #[test]
    fn test_progress_is_logged(ctx: &mut PopulateTestContext) {
        let plan = PopulatePlan {
            progress_every: 10,
            ..plan(Layout::Normalized, 30, 1)
        };
        populate(&mut ctx.db, &plan, &MemoryConfig::default(), &ctx.logs).unwrap();

        assert!(ctx.logs.contains("Created 10 tasks..."));
        assert!(ctx.logs.contains("Created 30 tasks..."));
        assert!(ctx.logs.contains("=== Starting normalized data creation ==="));
    }

    #[test]
    fn test_plan_from_config_picks_layout_fan_out() {
        let config = GenerateConfig::default();

        let duplicated = PopulatePlan::from_config(Layout::Duplicated, &config);
        assert_eq!(duplicated.fan_out, 50);
        assert_eq!(duplicated.expected_image_titles(), 500_000);

        let normalized = PopulatePlan::from_config(Layout::Normalized, &config);
        assert_eq!(normalized.fan_out, 5);
        assert_eq!(normalized.expected_image_titles(), 1);
    }
}
