#[cfg(test)]
mod tests {
    use dupnorm::db::db::Db;
    use dupnorm::libs::config::{MemoryConfig, RetrievalConfig};
    use dupnorm::libs::layout::Layout;
    use dupnorm::libs::log_buffer::LogBuffer;
    use dupnorm::libs::memory::HeapGuard;
    use dupnorm::libs::populate::{populate, PopulatePlan};
    use dupnorm::libs::retrieve::{
        materialize, retrieve_all, retrieve_in_batches, retrieve_on_current_thread, Abort, RetrievalContext,
    };
    use dupnorm::libs::runner::CancelToken;
    use dupnorm::db::records::Records;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct RetrievalTestContext {
        _temp_dir: TempDir,
        db: Db,
        logs: LogBuffer,
    }

    impl TestContext for RetrievalTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(&temp_dir.path().join("dupnorm.db")).unwrap();
            RetrievalTestContext {
                _temp_dir: temp_dir,
                db,
                logs: LogBuffer::new(),
            }
        }
    }

    impl RetrievalTestContext {
        fn populate(&mut self, layout: Layout, count: u64, fan_out: u32) {
            let plan = PopulatePlan {
                layout,
                count,
                fan_out,
                progress_every: 1_000,
            };
            populate(&mut self.db, &plan, &MemoryConfig::default(), &self.logs).unwrap();
            self.logs.clear();
        }

        fn context(&self, iterations: u32, batch_size: usize, memory: MemoryConfig) -> RetrievalContext {
            let config = RetrievalConfig {
                iterations,
                batch_size,
                iteration_pause_ms: 0,
                collection_pause_ms: 0,
                ..RetrievalConfig::default()
            };
            RetrievalContext::new(config, memory, self.logs.clone(), CancelToken::new())
        }
    }

    fn unlimited() -> MemoryConfig {
        MemoryConfig {
            heap_limit_mb: 1 << 20,
            ..MemoryConfig::default()
        }
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_duplicated_retrieval_materializes_every_task(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Duplicated, 200, 50);

        let outcome = retrieve_all(&ctx.db, &ctx.context(2, 100, unlimited())).unwrap();

        assert_eq!(outcome.layout, Some(Layout::Duplicated));
        assert_eq!(outcome.abort, None);
        assert_eq!(outcome.iterations.len(), 2);
        for pass in &outcome.iterations {
            assert_eq!(pass.tasks, 200);
            assert_eq!(pass.image_titles, 200 * 50);
        }
        assert!(ctx.logs.contains("Retrieved 200 tasks"));
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_normalized_tasks_hold_fan_out_projections(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Normalized, 300, 5);

        let guard = HeapGuard::unlimited();
        let stored = Records::new(&ctx.db.conn, Layout::Normalized).fetch_all(&guard).unwrap();
        let tasks = materialize(&stored, &guard).unwrap();

        assert_eq!(tasks.len(), 300);
        for (index, task) in tasks.iter().enumerate() {
            assert_eq!(task.id, index as i64 + 1);
            assert_eq!(task.image_titles.len(), 5);
            assert_eq!(task.image_titles[0].title, "リビング");
            assert_eq!(task.image_titles[4].portal_category, "LivingDining");
        }
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_foreground_retrieval_matches_background(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Normalized, 150, 5);
        let retrieval = ctx.context(1, 100, unlimited());

        let background = retrieve_all(&ctx.db, &retrieval).unwrap();
        let foreground = retrieve_on_current_thread(&ctx.db, &retrieval).unwrap();

        assert_eq!(background.iterations, foreground.iterations);
        assert_eq!(foreground.totals().tasks, 150);
        assert_eq!(foreground.totals().image_titles, 750);
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_batched_retrieval_over_ten_thousand_tasks(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Normalized, 10_000, 5);

        let outcome = retrieve_in_batches(&ctx.db, &ctx.context(1, 100, unlimited())).unwrap();

        assert_eq!(outcome.abort, None);
        assert_eq!(outcome.batch_sizes.len(), 100);
        assert!(outcome.batch_sizes.iter().all(|&size| size == 100));
        assert_eq!(outcome.batch_sizes.iter().sum::<usize>(), 10_000);
        assert_eq!(outcome.totals().image_titles, 50_000);
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_batched_retrieval_with_short_last_batch(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Duplicated, 250, 3);

        let outcome = retrieve_in_batches(&ctx.db, &ctx.context(2, 100, unlimited())).unwrap();

        assert_eq!(outcome.batch_sizes, vec![100, 100, 50]);
        assert_eq!(outcome.iterations.len(), 2);
        assert_eq!(outcome.totals().tasks, 500);
        assert_eq!(outcome.totals().image_titles, 1_500);
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_empty_store_reports_no_data(ctx: &mut RetrievalTestContext) {
        let outcome = retrieve_all(&ctx.db, &ctx.context(3, 100, unlimited())).unwrap();
        assert_eq!(outcome.layout, None);
        assert!(outcome.iterations.is_empty());
        assert!(ctx.logs.contains("No data found to retrieve"));

        let outcome = retrieve_in_batches(&ctx.db, &ctx.context(3, 100, unlimited())).unwrap();
        assert_eq!(outcome.layout, None);
        assert!(outcome.batch_sizes.is_empty());
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_exceeded_heap_limit_aborts_after_first_iteration(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Duplicated, 100, 10);
        let no_heap = MemoryConfig {
            heap_limit_mb: 0,
            ..MemoryConfig::default()
        };

        let outcome = retrieve_all(&ctx.db, &ctx.context(5, 100, no_heap.clone())).unwrap();
        assert_eq!(outcome.abort, Some(Abort::OutOfMemory));
        assert!(outcome.iterations.is_empty());
        assert!(ctx.logs.contains("OutOfMemory occurred at iteration #1"));
        assert!(!ctx.logs.contains("Retrieval #2/5"));

        let outcome = retrieve_in_batches(&ctx.db, &ctx.context(5, 10, no_heap)).unwrap();
        assert_eq!(outcome.abort, Some(Abort::OutOfMemory));
        assert!(outcome.iterations.is_empty());
    }

    #[test_context(RetrievalTestContext)]
    #[test]
    fn test_cancelled_retrieval_stops_before_next_iteration(ctx: &mut RetrievalTestContext) {
        ctx.populate(Layout::Normalized, 10, 1);
        let retrieval = ctx.context(5, 100, unlimited());
        retrieval.cancel.cancel();

        let outcome = retrieve_all(&ctx.db, &retrieval).unwrap();

        assert_eq!(outcome.abort, Some(Abort::Cancelled));
        assert!(outcome.iterations.is_empty());
    }
}
