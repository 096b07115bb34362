//! Bulk population of either layout.
//!
//! Both routines clear the target layout, then create `count` parents inside
//! one transaction. They differ only in how children are attached:
//!
//! - duplicated: `fan_out` fresh, field-identical child rows per parent
//! - normalized: one keyed child created up front, referenced `fan_out` times per parent

use crate::db::db::Db;
use crate::db::records::Records;
use crate::db::task_storage::TaskStorages;
use crate::db::task_storage_with_key::TaskStorageWithKeys;
use crate::libs::config::{GenerateConfig, MemoryConfig};
use crate::libs::error::{DemoError, Result};
use crate::libs::layout::Layout;
use crate::libs::log_buffer::LogBuffer;
use crate::libs::memory::MemorySnapshot;
use crate::libs::messages::Message;
use crate::libs::task::TaskImageTitles;
use std::time::Instant;

/// Key of the child every normalized parent points at.
pub const SHARED_IMAGE_TITLES_KEY: &str = "living_inside_1";

/// Content of every generated child record.
pub fn sample_image_titles() -> TaskImageTitles {
    TaskImageTitles::new("リビング", "Inside", "LivingDining")
}

/// What a population run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulatePlan {
    pub layout: Layout,
    pub count: u64,
    pub fan_out: u32,
    pub progress_every: u64,
}

impl PopulatePlan {
    pub fn from_config(layout: Layout, config: &GenerateConfig) -> Self {
        let fan_out = match layout {
            Layout::Duplicated => config.duplicate_fan_out,
            Layout::Normalized => config.normalized_fan_out,
        };
        PopulatePlan {
            layout,
            count: config.count,
            fan_out,
            progress_every: config.progress_every.max(1),
        }
    }

    /// Child rows the layout holds after this plan ran.
    pub fn expected_image_titles(&self) -> u64 {
        match self.layout {
            Layout::Duplicated => self.count * self.fan_out as u64,
            Layout::Normalized => 1,
        }
    }
}

/// Summary of a completed population run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulateOutcome {
    pub tasks: u64,
    pub image_titles: u64,
    pub elapsed_ms: u128,
}

pub fn populate(db: &mut Db, plan: &PopulatePlan, memory: &MemoryConfig, logs: &LogBuffer) -> Result<PopulateOutcome> {
    if plan.fan_out == 0 {
        return Err(DemoError::InvalidFanOut);
    }

    logs.log(Message::CreationStarted(plan.layout));
    logs.log_all(MemorySnapshot::capture(memory).report("Before creation"));

    let content = sample_image_titles();
    let tx = db.conn.transaction()?;
    Records::new(&tx, plan.layout).clear()?;

    let started = Instant::now();
    match plan.layout {
        Layout::Duplicated => {
            let tasks = TaskStorages::new(&tx);
            for id in 1..=plan.count {
                tasks.insert_with_copies(id as i64, &content, plan.fan_out)?;
                log_progress(logs, id, plan.progress_every);
            }
        }
        Layout::Normalized => {
            let tasks = TaskStorageWithKeys::new(&tx);
            if plan.count > 0 {
                tasks.upsert_image_titles(SHARED_IMAGE_TITLES_KEY, &content)?;
            }
            for id in 1..=plan.count {
                tasks.insert_with_references(id as i64, SHARED_IMAGE_TITLES_KEY, plan.fan_out)?;
                log_progress(logs, id, plan.progress_every);
            }
        }
    }
    tx.commit()?;
    let elapsed_ms = started.elapsed().as_millis();

    logs.log(Message::CreationFinished {
        layout: plan.layout,
        count: plan.count,
        elapsed_ms,
    });
    logs.log_all(MemorySnapshot::capture(memory).report("After creation"));

    let records = Records::new(&db.conn, plan.layout);
    let outcome = PopulateOutcome {
        tasks: records.count_tasks()?,
        image_titles: records.count_image_titles()?,
        elapsed_ms,
    };
    logs.log(Message::TableCount {
        type_name: plan.layout.image_titles_type_name(),
        count: outcome.image_titles,
    });
    logs.log(Message::TableCount {
        type_name: plan.layout.task_type_name(),
        count: outcome.tasks,
    });

    Ok(outcome)
}

fn log_progress(logs: &LogBuffer, created: u64, every: u64) {
    if created % every == 0 {
        logs.log(Message::CreatedProgress(created));
    }
}
