//! Heap and system memory diagnostics.
//!
//! Heap counters come from jemalloc (`stats.allocated` for live bytes,
//! `stats.active` for committed pages), system counters from `sysinfo`. The
//! heap ceiling is not a property of the process: it is the configured
//! `heap_limit_mb`, playing the role of a managed runtime's maximum heap.
//! [`HeapGuard`] enforces it during materialization so that exceeding it is a
//! recoverable [`DemoError::OutOfMemory`] rather than a process abort.
//!
//! ```rust,no_run
//! use dupnorm::libs::config::MemoryConfig;
//! use dupnorm::libs::memory::MemorySnapshot;
//!
//! let snapshot = MemorySnapshot::capture(&MemoryConfig::default());
//! for line in snapshot.report("Current") {
//!     println!("{}", line);
//! }
//! ```

use crate::libs::config::MemoryConfig;
use crate::libs::error::{DemoError, Result};
use crate::libs::log_buffer::LogBuffer;
use crate::libs::messages::Message;
use std::time::Duration;
use sysinfo::System;

const MB: u64 = 1024 * 1024;

/// Allocation probe sizes, 1 KB to 256 KB.
pub const PROBE_SIZES: [usize; 5] = [1024, 4096, 16384, 65536, 262144];

/// Live and committed heap bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapCounters {
    pub used: u64,
    pub total: u64,
}

#[cfg(not(target_env = "msvc"))]
pub fn heap_counters() -> HeapCounters {
    use tikv_jemalloc_ctl::{epoch, stats};

    // Statistics are cached until the epoch advances.
    let _ = epoch::advance();
    let used = stats::allocated::read().unwrap_or(0) as u64;
    let total = stats::active::read().unwrap_or(0) as u64;
    HeapCounters {
        used,
        total: total.max(used),
    }
}

#[cfg(target_env = "msvc")]
pub fn heap_counters() -> HeapCounters {
    use sysinfo::{ProcessRefreshKind, ProcessesToUpdate};

    let mut system = System::new();
    let Ok(pid) = sysinfo::get_current_pid() else {
        return HeapCounters { used: 0, total: 0 };
    };
    system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, ProcessRefreshKind::nothing().with_memory());
    let resident = system.process(pid).map(|p| p.memory()).unwrap_or(0);
    HeapCounters {
        used: resident,
        total: resident,
    }
}

/// Returns unused allocator pages to the operating system.
///
/// The closest native equivalent of a forced garbage collection pass: it
/// cannot free live objects, only the space they left behind.
pub fn collect() -> Result<()> {
    #[cfg(not(target_env = "msvc"))]
    {
        // MALLCTL_ARENAS_ALL
        let name = b"arena.4096.purge\0";
        // SAFETY: `name` is NUL-terminated and purge takes no input or output.
        let code = unsafe {
            tikv_jemalloc_sys::mallctl(
                name.as_ptr() as *const _,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                0,
            )
        };
        if code != 0 {
            return Err(DemoError::Allocator(format!("arena purge returned {}", code)));
        }
        tikv_jemalloc_ctl::epoch::advance().map_err(|e| DemoError::Allocator(e.to_string()))?;
    }
    Ok(())
}

/// Logs a failed collection step; the routine carries on either way.
pub fn report_collection(logs: &LogBuffer, result: Result<()>) {
    if let Err(e) = result {
        logs.log(Message::CollectionFailed(e.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageBand {
    Ok,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentationBand {
    Possible,
    Likely,
}

/// One reading of heap and system counters.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySnapshot {
    pub heap_used: u64,
    pub heap_total: u64,
    pub heap_max: u64,
    pub system_available: u64,
    pub system_total: u64,
    pub low_memory: bool,
}

impl MemorySnapshot {
    pub fn capture(config: &MemoryConfig) -> Self {
        let heap = heap_counters();

        let mut system = System::new();
        system.refresh_memory();
        let system_available = system.available_memory();
        let system_total = system.total_memory();

        Self::from_counters(heap, config.heap_limit_mb.saturating_mul(MB), system_available, system_total, config.low_memory_percent)
    }

    pub fn from_counters(heap: HeapCounters, heap_max: u64, system_available: u64, system_total: u64, low_memory_percent: u64) -> Self {
        let low_memory = system_total > 0 && system_available.saturating_mul(100) < system_total.saturating_mul(low_memory_percent);
        MemorySnapshot {
            heap_used: heap.used,
            heap_total: heap.total,
            heap_max: heap_max.max(1),
            system_available,
            system_total,
            low_memory,
        }
    }

    pub fn used_mb(&self) -> u64 {
        self.heap_used / MB
    }

    pub fn total_mb(&self) -> u64 {
        self.heap_total / MB
    }

    pub fn max_mb(&self) -> u64 {
        self.heap_max / MB
    }

    pub fn free_mb(&self) -> u64 {
        self.heap_total.saturating_sub(self.heap_used) / MB
    }

    pub fn usage_percent(&self) -> u64 {
        self.heap_used * 100 / self.heap_max
    }

    /// Share of the committed heap that holds no live data.
    pub fn free_percent(&self) -> u64 {
        if self.heap_total == 0 {
            return 0;
        }
        self.heap_total.saturating_sub(self.heap_used) * 100 / self.heap_total
    }

    pub fn remaining_mb(&self) -> i64 {
        (self.heap_max / MB) as i64 - (self.heap_total / MB) as i64
    }

    pub fn usage_band(&self) -> UsageBand {
        match self.usage_percent() {
            p if p > 85 => UsageBand::High,
            p if p > 70 => UsageBand::Moderate,
            _ => UsageBand::Ok,
        }
    }

    pub fn fragmentation_band(&self) -> Option<FragmentationBand> {
        let free_percent = self.free_percent();
        if free_percent > 50 && self.used_mb() > 100 {
            Some(FragmentationBand::Possible)
        } else if self.heap_total.saturating_mul(10) > self.heap_max.saturating_mul(8) && free_percent > 30 {
            Some(FragmentationBand::Likely)
        } else {
            None
        }
    }

    /// The labelled report lines, in display order.
    pub fn report(&self, label: &str) -> Vec<Message> {
        let label = label.to_string();
        let mut lines = vec![
            Message::HeapUsage {
                label: label.clone(),
                used_mb: self.used_mb(),
                max_mb: self.max_mb(),
                percent: self.usage_percent(),
            },
            Message::HeapAllocated {
                label: label.clone(),
                total_mb: self.total_mb(),
                free_mb: self.free_mb(),
            },
            Message::SystemAvailable {
                label: label.clone(),
                available_mb: self.system_available / MB,
            },
            Message::FreeWithin {
                label,
                free_percent: self.free_percent(),
                remaining_mb: self.remaining_mb(),
            },
        ];

        match self.fragmentation_band() {
            Some(FragmentationBand::Possible) => lines.push(Message::PossibleFragmentation),
            Some(FragmentationBand::Likely) => lines.push(Message::LikelyFragmentation),
            None => {}
        }

        if self.low_memory {
            lines.push(Message::SystemLowMemory);
        }

        let percent = self.usage_percent();
        lines.push(match self.usage_band() {
            UsageBand::High => Message::UsageHigh(percent),
            UsageBand::Moderate => Message::UsageModerate(percent),
            UsageBand::Ok => Message::UsageOk(percent),
        });

        lines
    }
}

/// Enforces the configured heap ceiling.
#[derive(Debug, Clone, Copy)]
pub struct HeapGuard {
    limit: u64,
}

impl HeapGuard {
    pub fn new(config: &MemoryConfig) -> Self {
        Self::with_limit(config.heap_limit_mb.saturating_mul(MB))
    }

    pub fn with_limit(limit: u64) -> Self {
        HeapGuard { limit }
    }

    pub fn unlimited() -> Self {
        HeapGuard { limit: u64::MAX }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Fails once live heap bytes exceed the limit.
    pub fn check(&self) -> Result<()> {
        self.check_additional(0)
    }

    /// Fails if `additional` more bytes would push live heap past the limit.
    pub fn check_additional(&self, additional: usize) -> Result<()> {
        if self.limit == u64::MAX {
            return Ok(());
        }
        let used = heap_counters().used;
        if used.saturating_add(additional as u64) > self.limit {
            return Err(DemoError::OutOfMemory {
                requested: additional,
                limit: self.limit as usize,
            });
        }
        Ok(())
    }

    /// `Vec::try_reserve` that also honors the limit.
    pub fn reserve<T>(&self, vec: &mut Vec<T>, additional: usize) -> Result<()> {
        if vec.capacity() - vec.len() >= additional {
            return Ok(());
        }
        // Growth doubles capacity, so that is what the allocation will cost.
        let grow_to = (vec.len() + additional).max(vec.capacity() * 2);
        self.check_additional((grow_to - vec.capacity()) * std::mem::size_of::<T>())?;
        vec.try_reserve(additional)?;
        Ok(())
    }
}

/// Allocates and immediately releases each probe size, stopping at the first
/// failure. Returns `(size_kb, succeeded)` for every attempted size.
pub fn probe_allocations(guard: &HeapGuard) -> Vec<(usize, bool)> {
    let mut results = Vec::with_capacity(PROBE_SIZES.len());
    for size in PROBE_SIZES {
        let ok = probe_one(size, guard).is_ok();
        results.push((size / 1024, ok));
        if !ok {
            break;
        }
    }
    results
}

fn probe_one(size: usize, guard: &HeapGuard) -> Result<()> {
    guard.check_additional(size)?;
    let mut buffer: Vec<u8> = Vec::new();
    buffer.try_reserve_exact(size)?;
    buffer.resize(size, 0);
    drop(std::hint::black_box(buffer));
    Ok(())
}

/// Full memory report: counters, bands, raw heap figures, and the
/// allocation probe before and after a collection pass.
pub fn show_memory_usage(config: &MemoryConfig, logs: &LogBuffer, collection_pause: Duration) {
    logs.log(Message::MemoryHeader);
    let snapshot = MemorySnapshot::capture(config);
    logs.log_all(snapshot.report("Current"));
    logs.log(Message::MaxHeap(snapshot.max_mb()));
    logs.log(Message::TotalHeap(snapshot.total_mb()));
    logs.log(Message::FreeHeap(snapshot.free_mb()));
    logs.log(Message::UsedHeap(snapshot.used_mb()));

    let guard = HeapGuard::new(config);
    logs.log(Message::FragmentationTestHeader);
    log_probe(logs, &guard, false);

    logs.log(Message::AfterCollectionHeader);
    report_collection(logs, collect());
    std::thread::sleep(collection_pause);
    log_probe(logs, &guard, true);
}

fn log_probe(logs: &LogBuffer, guard: &HeapGuard, after_collection: bool) {
    for (kb, ok) in probe_allocations(guard) {
        if ok {
            logs.log(Message::ProbeAllocated { kb, after_collection });
        } else {
            logs.log(Message::ProbeFailed { kb, after_collection });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(used_mb: u64, total_mb: u64, max_mb: u64) -> MemorySnapshot {
        MemorySnapshot::from_counters(
            HeapCounters {
                used: used_mb * MB,
                total: total_mb * MB,
            },
            max_mb * MB,
            4096 * MB,
            8192 * MB,
            10,
        )
    }

    #[test]
    fn usage_bands_follow_thresholds() {
        assert_eq!(snapshot(70, 80, 100).usage_band(), UsageBand::Ok);
        assert_eq!(snapshot(71, 80, 100).usage_band(), UsageBand::Moderate);
        assert_eq!(snapshot(86, 90, 100).usage_band(), UsageBand::High);
    }

    #[test]
    fn fragmentation_possible_with_high_free_share_and_usage() {
        let s = snapshot(150, 400, 1000);
        assert_eq!(s.free_percent(), 62);
        assert_eq!(s.fragmentation_band(), Some(FragmentationBand::Possible));
    }

    #[test]
    fn fragmentation_likely_near_capacity() {
        let s = snapshot(50, 90, 100);
        assert_eq!(s.fragmentation_band(), Some(FragmentationBand::Likely));
    }

    #[test]
    fn no_fragmentation_for_dense_heap() {
        assert_eq!(snapshot(50, 55, 1000).fragmentation_band(), None);
    }

    #[test]
    fn low_memory_flag_uses_percentage_of_total() {
        let low = MemorySnapshot::from_counters(HeapCounters { used: 0, total: 0 }, MB, 50 * MB, 1000 * MB, 10);
        assert!(low.low_memory);
        let fine = MemorySnapshot::from_counters(HeapCounters { used: 0, total: 0 }, MB, 500 * MB, 1000 * MB, 10);
        assert!(!fine.low_memory);
    }

    #[test]
    fn report_ends_with_usage_band() {
        let lines = snapshot(90, 95, 100).report("Test");
        assert!(matches!(lines.last(), Some(Message::UsageHigh(90))));
        assert!(!lines.iter().any(|l| matches!(l, Message::LikelyFragmentation)));
        assert!(lines[0].to_string().starts_with("[Test] Heap: 90 MB used / 100 MB max"));
    }

    #[test]
    fn guard_with_zero_limit_rejects_everything() {
        let guard = HeapGuard::with_limit(0);
        let mut v: Vec<u64> = Vec::new();
        assert!(guard.reserve(&mut v, 16).unwrap_err().is_out_of_memory());
    }

    #[test]
    fn unlimited_guard_probes_every_size() {
        let results = probe_allocations(&HeapGuard::unlimited());
        assert_eq!(results, vec![(1, true), (4, true), (16, true), (64, true), (256, true)]);
    }

    #[test]
    fn memory_usage_logs_both_probe_rounds() {
        let logs = LogBuffer::new();
        let config = MemoryConfig {
            heap_limit_mb: 1 << 20,
            low_memory_percent: 0,
        };
        show_memory_usage(&config, &logs, Duration::ZERO);
        assert!(logs.contains("=== Current Memory Usage ==="));
        assert!(logs.contains("✅ Successfully allocated 256KB"));
        assert!(logs.contains("✅ Post-collection: Successfully allocated 256KB"));
    }

    #[test]
    fn huge_heap_limit_saturates() {
        let config = MemoryConfig {
            heap_limit_mb: u64::MAX,
            low_memory_percent: u64::MAX,
        };
        let snapshot = MemorySnapshot::capture(&config);
        assert_eq!(snapshot.max_mb(), u64::MAX / MB);
        assert!(snapshot.remaining_mb() > 0);
        assert_eq!(HeapGuard::new(&config).limit(), u64::MAX);
    }

    #[cfg(not(target_env = "msvc"))]
    #[test]
    fn collection_pass_reports_success() {
        assert!(collect().is_ok());
    }

    #[test]
    fn failed_collection_is_logged() {
        let logs = LogBuffer::new();
        report_collection(&logs, Ok(()));
        assert!(logs.is_empty());

        report_collection(&logs, Err(DemoError::Allocator("arena purge returned 14".to_string())));
        assert_eq!(
            logs.texts(),
            vec!["⚠️ Collection pass failed: allocator control failed: arena purge returned 14"]
        );
    }

    #[test]
    fn failed_probe_stops_the_sequence() {
        let results = probe_allocations(&HeapGuard::with_limit(0));
        assert_eq!(results, vec![(1, false)]);
    }
}
