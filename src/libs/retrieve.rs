//! Retrieval routines: load every parent, project it into domain objects,
//! count what was produced, throw it away, repeat.
//!
//! The three variants are semantically equivalent:
//!
//! - [`retrieve_all`]: one query for all parents per iteration
//! - [`retrieve_in_batches`]: fixed-size parent ranges per iteration
//! - [`retrieve_on_current_thread`]: `retrieve_all` meant to be called from the
//!   caller's own thread instead of the blocking pool
//!
//! A fault inside an iteration (out-of-memory or anything else) is logged
//! with a marker and ends the loop; teardown logging still runs and the
//! routine itself returns `Ok`. Only failures outside the loop propagate.

use crate::db::db::Db;
use crate::db::records::Records;
use crate::libs::config::{MemoryConfig, RetrievalConfig};
use crate::libs::error::{DemoError, Result};
use crate::libs::layout::Layout;
use crate::libs::log_buffer::LogBuffer;
use crate::libs::memory::{self, HeapGuard, MemorySnapshot};
use crate::libs::messages::Message;
use crate::libs::runner::CancelToken;
use crate::libs::task::{StoredTask, Task};
use std::ops::Range;
use std::thread;
use std::time::{Duration, Instant};

/// Projected tasks are checked against the heap limit this often.
const GUARD_STRIDE: usize = 64;

/// Everything a retrieval routine needs besides the store session.
#[derive(Clone)]
pub struct RetrievalContext {
    pub config: RetrievalConfig,
    pub memory: MemoryConfig,
    pub logs: LogBuffer,
    pub cancel: CancelToken,
}

impl RetrievalContext {
    pub fn new(config: RetrievalConfig, memory: MemoryConfig, logs: LogBuffer, cancel: CancelToken) -> Self {
        RetrievalContext {
            config,
            memory,
            logs,
            cancel,
        }
    }

    fn guard(&self) -> HeapGuard {
        HeapGuard::new(&self.memory)
    }

    fn log_memory(&self, label: &str) {
        self.logs.log_all(MemorySnapshot::capture(&self.memory).report(label));
    }

    fn pause(&self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }

    /// Collection pass, then the configured pause.
    fn collect(&self, db: &Db) {
        self.collect_store(db);
        self.pause(self.config.collection_pause_ms);
    }

    /// Allocator purge and the session's page cache; failures are logged.
    fn collect_store(&self, db: &Db) {
        memory::report_collection(&self.logs, memory::collect());
        memory::report_collection(&self.logs, db.shrink_memory());
    }
}

/// Why a routine stopped before running every iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    OutOfMemory,
    Fault(String),
    Cancelled,
}

/// Counts from one fetch-and-materialize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub tasks: usize,
    pub image_titles: usize,
}

impl PassStats {
    fn add(&mut self, other: PassStats) {
        self.tasks += other.tasks;
        self.image_titles += other.image_titles;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalOutcome {
    /// Layout that was read, `None` when the store was empty.
    pub layout: Option<Layout>,
    /// One entry per completed iteration.
    pub iterations: Vec<PassStats>,
    /// Batch sizes of the first completed iteration (batched variant only).
    pub batch_sizes: Vec<usize>,
    pub abort: Option<Abort>,
}

impl RetrievalOutcome {
    pub fn totals(&self) -> PassStats {
        let mut totals = PassStats::default();
        for pass in &self.iterations {
            totals.add(*pass);
        }
        totals
    }
}

/// Projects stored parents into domain tasks, honoring the heap limit.
pub fn materialize(stored: &[StoredTask], guard: &HeapGuard) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    guard.reserve(&mut tasks, stored.len())?;
    for (index, stored_task) in stored.iter().enumerate() {
        if index % GUARD_STRIDE == 0 {
            guard.check()?;
        }
        tasks.push(Task::try_from_stored(stored_task)?);
    }
    Ok(tasks)
}

fn count_image_titles(tasks: &[Task]) -> usize {
    tasks.iter().map(|t| t.image_titles.len()).sum()
}

/// Splits `total` parents into consecutive ranges of at most `batch_size`.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..total.div_ceil(batch_size))
        .map(|index| {
            let start = index * batch_size;
            start..(start + batch_size).min(total)
        })
        .collect()
}

fn fault_to_abort(ctx: &RetrievalContext, location: String, error: DemoError) -> Abort {
    if error.is_out_of_memory() {
        ctx.logs.log(Message::OutOfMemoryAt(location));
        ctx.logs.log(Message::ErrorDetail(error.to_string()));
        Abort::OutOfMemory
    } else {
        let message = error.to_string();
        ctx.logs.log(Message::FaultAt {
            location,
            error: message.clone(),
        });
        Abort::Fault(message)
    }
}

pub fn retrieve_all(db: &Db, ctx: &RetrievalContext) -> Result<RetrievalOutcome> {
    ctx.logs.log(Message::RetrievalStarted(ctx.config.iterations));
    repeated_full_retrieval(db, ctx)
}

pub fn retrieve_on_current_thread(db: &Db, ctx: &RetrievalContext) -> Result<RetrievalOutcome> {
    ctx.logs.log(Message::ForegroundRetrievalStarted(ctx.config.iterations));
    repeated_full_retrieval(db, ctx)
}

fn repeated_full_retrieval(db: &Db, ctx: &RetrievalContext) -> Result<RetrievalOutcome> {
    ctx.log_memory("Before continuous retrievals");

    let overall = Instant::now();
    let mut outcome = RetrievalOutcome::default();
    let Some(layout) = Records::detect(&db.conn)? else {
        ctx.logs.log(Message::NoDataToRetrieve);
        return Ok(outcome);
    };
    outcome.layout = Some(layout);

    let records = Records::new(&db.conn, layout);
    let guard = ctx.guard();
    let iterations = ctx.config.iterations;

    for iteration in 1..=iterations {
        if ctx.cancel.is_cancelled() {
            ctx.logs.log(Message::RoutineCancelled(format!("iteration #{}", iteration)));
            outcome.abort = Some(Abort::Cancelled);
            break;
        }

        ctx.logs.log(Message::RetrievalHeader { iteration, iterations });
        let started = Instant::now();

        let pass = records.fetch_all(&guard).and_then(|stored| materialize(&stored, &guard));
        match pass {
            Ok(tasks) => {
                let stats = PassStats {
                    tasks: tasks.len(),
                    image_titles: count_image_titles(&tasks),
                };
                drop(tasks);
                ctx.logs.log(Message::RetrievedTasks {
                    iteration,
                    count: stats.tasks,
                    layout,
                });
                ctx.logs.log(Message::ImageTitlesCreated {
                    iteration,
                    count: stats.image_titles,
                });
                ctx.logs.log(Message::IterationCompleted {
                    iteration,
                    elapsed_ms: started.elapsed().as_millis(),
                });
                outcome.iterations.push(stats);

                if ctx.config.memory_log_every > 0 && iteration % ctx.config.memory_log_every == 0 {
                    ctx.log_memory(&format!("After iteration {}", iteration));
                }
            }
            Err(error) => {
                outcome.abort = Some(fault_to_abort(ctx, format!("iteration #{}", iteration), error));
            }
        }

        ctx.pause(ctx.config.iteration_pause_ms);
        if outcome.abort.is_some() {
            break;
        }
    }

    ctx.logs.log(Message::RetrievalCompleted);
    ctx.logs.log(Message::TotalTime(overall.elapsed().as_millis()));
    ctx.log_memory("After all retrievals");

    ctx.collect(db);
    ctx.log_memory("After final collection");

    Ok(outcome)
}

pub fn retrieve_in_batches(db: &Db, ctx: &RetrievalContext) -> Result<RetrievalOutcome> {
    let iterations = ctx.config.iterations;
    let batch_size = ctx.config.batch_size.max(1);
    ctx.logs.log(Message::BatchStarted { iterations, batch_size });
    ctx.log_memory("Before batch processing");

    let overall = Instant::now();
    let mut outcome = RetrievalOutcome::default();
    let Some(layout) = Records::detect(&db.conn)? else {
        ctx.logs.log(Message::NoDataToRetrieve);
        return Ok(outcome);
    };
    outcome.layout = Some(layout);

    let records = Records::new(&db.conn, layout);
    let guard = ctx.guard();
    let total = records.count_tasks()? as usize;
    let batches = plan_batches(total, batch_size);
    ctx.logs.log(Message::BatchPlan {
        total,
        batch_size,
        batches: batches.len(),
    });

    let mut grand_total = PassStats::default();
    'iterations: for iteration in 1..=iterations {
        ctx.logs.log(Message::BatchIterationHeader { iteration, iterations });
        let mut iteration_total = PassStats::default();
        let mut sizes = Vec::with_capacity(batches.len());

        for (index, range) in batches.iter().enumerate() {
            let batch = index + 1;
            if ctx.cancel.is_cancelled() {
                ctx.logs.log(Message::RoutineCancelled(format!("iteration {} batch {}", iteration, batch)));
                outcome.abort = Some(Abort::Cancelled);
                break;
            }

            ctx.logs.log(Message::BatchHeader {
                iteration,
                batch,
                batches: batches.len(),
                offset: range.start,
                size: range.len(),
            });
            let started = Instant::now();

            let pass = records
                .fetch_range(range.start, range.len(), &guard)
                .and_then(|stored| materialize(&stored, &guard));
            match pass {
                Ok(tasks) => {
                    let stats = PassStats {
                        tasks: tasks.len(),
                        image_titles: count_image_titles(&tasks),
                    };
                    drop(tasks);
                    ctx.logs.log(Message::BatchRetrieved {
                        iteration,
                        batch,
                        count: stats.tasks,
                        layout,
                    });
                    ctx.logs.log(Message::BatchImageTitles {
                        iteration,
                        batch,
                        count: stats.image_titles,
                    });
                    ctx.logs.log(Message::BatchCompleted {
                        iteration,
                        batch,
                        elapsed_ms: started.elapsed().as_millis(),
                    });
                    iteration_total.add(stats);
                    sizes.push(stats.tasks);

                    if ctx.config.memory_log_every_batches > 0 && batch % ctx.config.memory_log_every_batches == 0 {
                        ctx.log_memory(&format!("After iter {} batch {}", iteration, batch));
                    }
                    if ctx.config.collect_every_batches > 0 && batch % ctx.config.collect_every_batches == 0 {
                        ctx.collect_store(db);
                        ctx.pause(ctx.config.iteration_pause_ms);
                        ctx.logs.log(Message::ForcedCollection(format!("iter {} batch {}", iteration, batch)));
                    }
                }
                Err(error) => {
                    let location = format!("iteration {} batch {}", iteration, batch);
                    outcome.abort = Some(fault_to_abort(ctx, location, error));
                }
            }

            ctx.pause(ctx.config.iteration_pause_ms);
            if outcome.abort.is_some() {
                break;
            }
        }

        ctx.logs.log(Message::BatchIterationCompleted(iteration));
        ctx.logs.log(Message::BatchIterationSummary {
            iteration,
            tasks: iteration_total.tasks,
            image_titles: iteration_total.image_titles,
        });
        grand_total.add(iteration_total);
        ctx.log_memory(&format!("After iteration {}", iteration));
        ctx.collect(db);

        if outcome.abort.is_some() {
            break 'iterations;
        }
        if outcome.batch_sizes.is_empty() {
            outcome.batch_sizes = sizes;
        }
        outcome.iterations.push(iteration_total);
    }

    ctx.logs.log(Message::BatchAllCompleted);
    ctx.logs.log(Message::GrandTotalTasks(grand_total.tasks));
    ctx.logs.log(Message::GrandTotalImageTitles(grand_total.image_titles));
    ctx.logs.log(Message::TotalTime(overall.elapsed().as_millis()));
    ctx.log_memory("After all batch processing");

    ctx.collect(db);
    ctx.log_memory("After final collection");

    Ok(outcome)
}
