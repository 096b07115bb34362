use crate::libs::layout::Layout;

#[derive(Debug, Clone)]
pub enum Message {
    // === STORE MESSAGES ===
    ClearingAllData,
    AllDataCleared,
    StoreInitialized,
    StoreReset,
    SchemaRecreated { found: u32, expected: u32 },
    MigrationApplied { version: u32, name: &'static str },

    // === POPULATION MESSAGES ===
    CreationStarted(Layout),
    CreatedProgress(u64),
    CreationFinished { layout: Layout, count: u64, elapsed_ms: u128 },
    TableCount { type_name: &'static str, count: u64 },

    // === MONITOR MESSAGES ===
    MonitoringStarted,
    MonitoringLayout(Layout),
    NoDataToMonitor,
    ChangeDetected(usize),
    ConvertedTasks(usize),
    OutOfMemoryDuringConversion,
    FaultDuringConversion(String),
    MonitorStopped,
    MonitorShuttingDown,
    MonitorError(String),
    MonitorReadFailed(String),

    // === RETRIEVAL MESSAGES ===
    RetrievalStarted(u32),
    ForegroundRetrievalStarted(u32),
    NoDataToRetrieve,
    RetrievalHeader { iteration: u32, iterations: u32 },
    RetrievedTasks { iteration: u32, count: usize, layout: Layout },
    ImageTitlesCreated { iteration: u32, count: usize },
    IterationCompleted { iteration: u32, elapsed_ms: u128 },
    OutOfMemoryAt(String),
    ErrorDetail(String),
    FaultAt { location: String, error: String },
    RoutineCancelled(String),
    RetrievalCompleted,
    TotalTime(u128),

    // === BATCH MESSAGES ===
    BatchStarted { iterations: u32, batch_size: usize },
    BatchPlan { total: usize, batch_size: usize, batches: usize },
    BatchIterationHeader { iteration: u32, iterations: u32 },
    BatchHeader { iteration: u32, batch: usize, batches: usize, offset: usize, size: usize },
    BatchRetrieved { iteration: u32, batch: usize, count: usize, layout: Layout },
    BatchImageTitles { iteration: u32, batch: usize, count: usize },
    BatchCompleted { iteration: u32, batch: usize, elapsed_ms: u128 },
    ForcedCollection(String),
    CollectionFailed(String),
    BatchIterationCompleted(u32),
    BatchIterationSummary { iteration: u32, tasks: usize, image_titles: usize },
    BatchAllCompleted,
    GrandTotalTasks(usize),
    GrandTotalImageTitles(usize),

    // === MEMORY MESSAGES ===
    MemoryHeader,
    HeapUsage { label: String, used_mb: u64, max_mb: u64, percent: u64 },
    HeapAllocated { label: String, total_mb: u64, free_mb: u64 },
    SystemAvailable { label: String, available_mb: u64 },
    FreeWithin { label: String, free_percent: u64, remaining_mb: i64 },
    PossibleFragmentation,
    LikelyFragmentation,
    SystemLowMemory,
    UsageHigh(u64),
    UsageModerate(u64),
    UsageOk(u64),
    MaxHeap(u64),
    TotalHeap(u64),
    FreeHeap(u64),
    UsedHeap(u64),
    FragmentationTestHeader,
    AfterCollectionHeader,
    ProbeAllocated { kb: usize, after_collection: bool },
    ProbeFailed { kb: usize, after_collection: bool },

    // === CONSOLE MESSAGES ===
    ConsoleTitle,
    ConsoleSelectAction,
    ConsoleActionGenerateDuplicate,
    ConsoleActionGenerateNormalized,
    ConsoleActionMonitor,
    ConsoleActionRetrieve,
    ConsoleActionBatches,
    ConsoleActionRetrieveMain,
    ConsoleActionMemory,
    ConsoleActionShowLogs,
    ConsoleActionStopMonitor,
    ConsoleActionQuit,
    ConsoleRunning,
    ConsoleIdle,
    LogPanelHeader(usize),
    LogPanelEmpty,
    RoutineAlreadyRunning,
    RoutineStarted(String),
    RoutineFinished(String),
    RoutineFailed(String),
    TaskPanicked(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigModuleGenerate,
    ConfigModuleRetrieval,
    ConfigModuleMemory,
    PromptTaskCount,
    PromptDuplicateFanOut,
    PromptNormalizedFanOut,
    PromptIterations,
    PromptBatchSize,
    PromptIterationPause,
    PromptHeapLimit,
    PromptLowMemoryPercent,
    PromptPollInterval,
}
