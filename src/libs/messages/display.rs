//! Display implementation for dupnorm messages.
//!
//! All user-facing text lives here so the routines only ever construct
//! `Message` values. Routine output mirrors the wording the log panel shows.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === STORE MESSAGES ===
            Message::ClearingAllData => "Clearing all existing data...".to_string(),
            Message::AllDataCleared => "All existing data cleared".to_string(),
            Message::StoreInitialized => "Store initialized".to_string(),
            Message::StoreReset => "All record tables cleared".to_string(),
            Message::SchemaRecreated { found, expected } => {
                format!("Schema version {} does not match {}, store recreated", found, expected)
            }
            Message::MigrationApplied { version, name } => format!("Applied migration {}: {}", version, name),

            // === POPULATION MESSAGES ===
            Message::CreationStarted(layout) => format!("=== Starting {} data creation ===", layout),
            Message::CreatedProgress(count) => format!("Created {} tasks...", count),
            Message::CreationFinished { layout, count, elapsed_ms } => {
                format!("Created {} tasks with {} data in {}ms", count, layout, elapsed_ms)
            }
            Message::TableCount { type_name, count } => format!("Total {} objects: {}", type_name, count),

            // === MONITOR MESSAGES ===
            Message::MonitoringStarted => "=== Starting store monitoring ===".to_string(),
            Message::MonitoringLayout(layout) => format!("Monitoring {} data with a change listener...", layout),
            Message::NoDataToMonitor => "No data to monitor".to_string(),
            Message::ChangeDetected(count) => format!("Store change detected: {} tasks", count),
            Message::ConvertedTasks(count) => format!("Converted {} tasks to domain objects", count),
            Message::OutOfMemoryDuringConversion => "⚠️ OutOfMemory during domain conversion!".to_string(),
            Message::FaultDuringConversion(error) => format!("⚠️ Fault during domain conversion: {}", error),
            Message::MonitorStopped => "Store monitoring stopped".to_string(),
            Message::MonitorShuttingDown => "Shutting down store monitor...".to_string(),
            Message::MonitorError(error) => format!("Store monitor failed: {}", error),
            Message::MonitorReadFailed(error) => format!("⚠️ Store read failed, still monitoring: {}", error),

            // === RETRIEVAL MESSAGES ===
            Message::RetrievalStarted(iterations) => format!("=== Starting {} continuous task retrievals ===", iterations),
            Message::ForegroundRetrievalStarted(iterations) => {
                format!("=== Starting {} continuous task retrievals on the calling thread ===", iterations)
            }
            Message::NoDataToRetrieve => "No data found to retrieve".to_string(),
            Message::RetrievalHeader { iteration, iterations } => format!("--- Retrieval #{}/{} ---", iteration, iterations),
            Message::RetrievedTasks { iteration, count, layout } => {
                format!("#{}: Retrieved {} tasks from {} data", iteration, count, layout)
            }
            Message::ImageTitlesCreated { iteration, count } => {
                format!("#{}: Total TaskImageTitles objects created: {}", iteration, count)
            }
            Message::IterationCompleted { iteration, elapsed_ms } => format!("#{}: Completed in {}ms", iteration, elapsed_ms),
            Message::OutOfMemoryAt(location) => format!("⚠️ OutOfMemory occurred at {}!", location),
            Message::ErrorDetail(error) => format!("Error: {}", error),
            Message::FaultAt { location, error } => format!("⚠️ Exception occurred at {}: {}", location, error),
            Message::RoutineCancelled(location) => format!("⏹ Cancelled at {}", location),
            Message::RetrievalCompleted => "=== Continuous retrieval completed ===".to_string(),
            Message::TotalTime(ms) => format!("Total time: {}ms", ms),

            // === BATCH MESSAGES ===
            Message::BatchStarted { iterations, batch_size } => {
                format!("=== Starting {} iterations of batch processing ({} items per batch) ===", iterations, batch_size)
            }
            Message::BatchPlan { total, batch_size, batches } => {
                format!("Total tasks: {}, Batch size: {}, Total batches per iteration: {}", total, batch_size, batches)
            }
            Message::BatchIterationHeader { iteration, iterations } => format!("=== Iteration {}/{} ===", iteration, iterations),
            Message::BatchHeader { iteration, batch, batches, offset, size } => {
                format!("--- Iter {}: Batch {}/{} (offset: {}, size: {}) ---", iteration, batch, batches, offset, size)
            }
            Message::BatchRetrieved { iteration, batch, count, layout } => {
                format!("Iter {} Batch {}: Retrieved {} tasks from {} data", iteration, batch, count, layout)
            }
            Message::BatchImageTitles { iteration, batch, count } => {
                format!("Iter {} Batch {}: TaskImageTitles objects created: {}", iteration, batch, count)
            }
            Message::BatchCompleted { iteration, batch, elapsed_ms } => {
                format!("Iter {} Batch {}: Completed in {}ms", iteration, batch, elapsed_ms)
            }
            Message::ForcedCollection(label) => format!("Forced collection after {}", label),
            Message::CollectionFailed(error) => format!("⚠️ Collection pass failed: {}", error),
            Message::BatchIterationCompleted(iteration) => format!("--- Iteration {} completed ---", iteration),
            Message::BatchIterationSummary { iteration, tasks, image_titles } => {
                format!("Iter {}: Processed {} tasks, Created {} TaskImageTitles", iteration, tasks, image_titles)
            }
            Message::BatchAllCompleted => "=== All batch processing iterations completed ===".to_string(),
            Message::GrandTotalTasks(count) => format!("Grand total processed tasks: {}", count),
            Message::GrandTotalImageTitles(count) => format!("Grand total ImageTitles objects created: {}", count),

            // === MEMORY MESSAGES ===
            Message::MemoryHeader => "=== Current Memory Usage ===".to_string(),
            Message::HeapUsage { label, used_mb, max_mb, percent } => {
                format!("[{}] Heap: {} MB used / {} MB max ({}%)", label, used_mb, max_mb, percent)
            }
            Message::HeapAllocated { label, total_mb, free_mb } => {
                format!("[{}] Total heap allocated: {} MB, Free in allocated: {} MB", label, total_mb, free_mb)
            }
            Message::SystemAvailable { label, available_mb } => format!("[{}] System available memory: {} MB", label, available_mb),
            Message::FreeWithin { label, free_percent, remaining_mb } => {
                format!("[{}] Free within allocated: {}%, Remaining capacity: {} MB", label, free_percent, remaining_mb)
            }
            Message::PossibleFragmentation => "🟡 Possible fragmentation: High free space but significant usage".to_string(),
            Message::LikelyFragmentation => "🟠 Fragmentation likely: Near max capacity with high free percentage".to_string(),
            Message::SystemLowMemory => "⚠️ SYSTEM LOW MEMORY WARNING (not app-specific)".to_string(),
            Message::UsageHigh(percent) => format!("🔴 App memory usage HIGH: {}%", percent),
            Message::UsageModerate(percent) => format!("🟡 App memory usage MODERATE: {}%", percent),
            Message::UsageOk(percent) => format!("🟢 App memory usage OK: {}%", percent),
            Message::MaxHeap(mb) => format!("Max heap: {} MB", mb),
            Message::TotalHeap(mb) => format!("Total heap: {} MB", mb),
            Message::FreeHeap(mb) => format!("Free heap: {} MB", mb),
            Message::UsedHeap(mb) => format!("Used heap: {} MB", mb),
            Message::FragmentationTestHeader => "=== Memory Fragmentation Test ===".to_string(),
            Message::AfterCollectionHeader => "--- After collection ---".to_string(),
            Message::ProbeAllocated { kb, after_collection } => {
                if *after_collection {
                    format!("✅ Post-collection: Successfully allocated {}KB", kb)
                } else {
                    format!("✅ Successfully allocated {}KB", kb)
                }
            }
            Message::ProbeFailed { kb, after_collection } => {
                if *after_collection {
                    format!("❌ Post-collection: Still failed to allocate {}KB", kb)
                } else {
                    format!("❌ Failed to allocate {}KB - Fragmentation detected!", kb)
                }
            }

            // === CONSOLE MESSAGES ===
            Message::ConsoleTitle => "dupnorm: duplicated vs normalized memory test".to_string(),
            Message::ConsoleSelectAction => "Select an action".to_string(),
            Message::ConsoleActionGenerateDuplicate => "Generate duplicate data".to_string(),
            Message::ConsoleActionGenerateNormalized => "Generate normalized data".to_string(),
            Message::ConsoleActionMonitor => "Start change monitoring".to_string(),
            Message::ConsoleActionRetrieve => "Get all tasks".to_string(),
            Message::ConsoleActionBatches => "Get all tasks in batches".to_string(),
            Message::ConsoleActionRetrieveMain => "Get all tasks on the calling thread".to_string(),
            Message::ConsoleActionMemory => "Show memory usage".to_string(),
            Message::ConsoleActionShowLogs => "Refresh log panel".to_string(),
            Message::ConsoleActionStopMonitor => "Stop change monitoring".to_string(),
            Message::ConsoleActionQuit => "Quit".to_string(),
            Message::ConsoleRunning => "Status: running".to_string(),
            Message::ConsoleIdle => "Status: idle".to_string(),
            Message::LogPanelHeader(count) => format!("--- Logs ({} most recent, newest first) ---", count),
            Message::LogPanelEmpty => "--- Logs: empty ---".to_string(),
            Message::RoutineAlreadyRunning => "A routine is already running, wait for it to finish".to_string(),
            Message::RoutineStarted(name) => format!("Started: {}", name),
            Message::RoutineFinished(name) => format!("Finished: {}", name),
            Message::RoutineFailed(error) => format!("Routine failed: {}", error),
            Message::TaskPanicked(error) => format!("Background task panicked: {}", error),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed, defaults apply".to_string(),
            Message::ConfigModuleGenerate => "Data generation".to_string(),
            Message::ConfigModuleRetrieval => "Retrieval".to_string(),
            Message::ConfigModuleMemory => "Memory diagnostics".to_string(),
            Message::PromptTaskCount => "Number of tasks to create".to_string(),
            Message::PromptDuplicateFanOut => "Duplicated image titles per task".to_string(),
            Message::PromptNormalizedFanOut => "Shared image title references per task".to_string(),
            Message::PromptIterations => "Retrieval iterations".to_string(),
            Message::PromptBatchSize => "Batch size".to_string(),
            Message::PromptIterationPause => "Pause between iterations (ms)".to_string(),
            Message::PromptHeapLimit => "Heap limit (MB)".to_string(),
            Message::PromptLowMemoryPercent => "Low system memory threshold (%)".to_string(),
            Message::PromptPollInterval => "Monitor poll interval (ms)".to_string(),
        };
        write!(f, "{}", s)
    }
}
