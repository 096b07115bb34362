//! Configuration management for dupnorm.
//!
//! Settings live in `config.json` in the data directory resolved by
//! [`DataStorage`]. Every section is optional; a missing file or a missing
//! section falls back to the defaults, which match the reference workload
//! (10,000 tasks, fan-out 50 or 5, 10 iterations, batches of 100).
//!
//! ```rust,no_run
//! use dupnorm::libs::config::Config;
//!
//! let config = Config::read()?;
//! let retrieval = config.retrieval();
//! println!("{} iterations", retrieval.iterations);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DB_FILE_NAME: &str = "dupnorm.db";

/// Bulk population parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerateConfig {
    /// Number of parent records created per run.
    pub count: u64,
    /// Child copies attached to each parent in the duplicated layout.
    pub duplicate_fan_out: u32,
    /// References to the shared child held by each parent in the normalized layout.
    pub normalized_fan_out: u32,
    /// A progress line is logged every this many parents.
    pub progress_every: u64,
}

/// Parameters shared by the three retrieval variants.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RetrievalConfig {
    /// How many times the full fetch-and-materialize cycle runs.
    pub iterations: u32,
    /// Parents per batch for the batched variant.
    pub batch_size: usize,
    /// Pause after each iteration (and each batch), in milliseconds.
    pub iteration_pause_ms: u64,
    /// Pause after a forced collection pass, in milliseconds.
    pub collection_pause_ms: u64,
    /// A memory report is logged every this many iterations.
    pub memory_log_every: u32,
    /// A memory report is logged every this many batches.
    pub memory_log_every_batches: usize,
    /// A collection pass is forced every this many batches.
    pub collect_every_batches: usize,
}

/// Change monitor settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Interval in milliseconds between change counter checks.
    pub poll_interval: u64,
}

/// Diagnostics reporter settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MemoryConfig {
    /// Heap ceiling in MB. Materialization past this point fails with an
    /// out-of-memory error instead of letting the process grow unbounded.
    pub heap_limit_mb: u64,
    /// The system is flagged as low on memory when available memory drops
    /// below this share of total memory.
    pub low_memory_percent: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate: Option<GenerateConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<MonitorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryConfig>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            count: 10_000,
            duplicate_fan_out: 50,
            normalized_fan_out: 5,
            progress_every: 1_000,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalConfig {
            iterations: 10,
            batch_size: 100,
            iteration_pause_ms: 50,
            collection_pause_ms: 100,
            memory_log_every: 5,
            memory_log_every_batches: 5,
            collect_every_batches: 10,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig { poll_interval: 500 }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            heap_limit_mb: 512,
            low_memory_percent: 10,
        }
    }
}

impl Config {
    /// Reads the configuration from the default data directory.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        Self::read_from(&config_file_path)
    }

    pub fn read_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        self.save_to(&config_file_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let config_file = File::create(path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    pub fn database_file(&self) -> &str {
        self.database.as_deref().unwrap_or(DB_FILE_NAME)
    }

    pub fn generate(&self) -> GenerateConfig {
        self.generate.clone().unwrap_or_default()
    }

    pub fn retrieval(&self) -> RetrievalConfig {
        self.retrieval.clone().unwrap_or_default()
    }

    pub fn monitor(&self) -> MonitorConfig {
        self.monitor.clone().unwrap_or_default()
    }

    pub fn memory(&self) -> MemoryConfig {
        self.memory.clone().unwrap_or_default()
    }

    /// Interactive setup wizard. Existing values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = [Message::ConfigModuleGenerate, Message::ConfigModuleRetrieval, Message::ConfigModuleMemory];
        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .items(&modules.iter().map(|m| m.to_string()).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match selection {
                0 => {
                    let default = config.generate();
                    msg_print!(Message::ConfigModuleGenerate);
                    config.generate = Some(GenerateConfig {
                        count: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptTaskCount.to_string())
                            .default(default.count)
                            .interact_text()?,
                        duplicate_fan_out: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptDuplicateFanOut.to_string())
                            .default(default.duplicate_fan_out)
                            .interact_text()?,
                        normalized_fan_out: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptNormalizedFanOut.to_string())
                            .default(default.normalized_fan_out)
                            .interact_text()?,
                        progress_every: default.progress_every,
                    });
                }
                1 => {
                    let default = config.retrieval();
                    msg_print!(Message::ConfigModuleRetrieval);
                    config.retrieval = Some(RetrievalConfig {
                        iterations: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptIterations.to_string())
                            .default(default.iterations)
                            .interact_text()?,
                        batch_size: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBatchSize.to_string())
                            .default(default.batch_size)
                            .interact_text()?,
                        iteration_pause_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptIterationPause.to_string())
                            .default(default.iteration_pause_ms)
                            .interact_text()?,
                        ..default
                    });
                    let monitor = config.monitor();
                    config.monitor = Some(MonitorConfig {
                        poll_interval: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptPollInterval.to_string())
                            .default(monitor.poll_interval)
                            .interact_text()?,
                    });
                }
                2 => {
                    let default = config.memory();
                    msg_print!(Message::ConfigModuleMemory);
                    config.memory = Some(MemoryConfig {
                        heap_limit_mb: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptHeapLimit.to_string())
                            .default(default.heap_limit_mb)
                            .interact_text()?,
                        low_memory_percent: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptLowMemoryPercent.to_string())
                            .default(default.low_memory_percent)
                            .interact_text()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
