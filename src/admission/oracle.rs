//! Capacity oracles
//!
//! Sources of memory and process information for admission control.

use std::fs;

use parking_lot::Mutex;

/// Point-in-time memory figures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Bytes that can still be allocated right now
    pub free_bytes: u64,

    /// Bytes currently held by this process
    pub used_bytes: u64,

    /// Budget the process may grow to
    pub limit_bytes: u64,
}

impl MemorySnapshot {
    /// A snapshot that never limits anything
    pub const fn unbounded() -> Self {
        Self {
            free_bytes: u64::MAX,
            used_bytes: 0,
            limit_bytes: u64::MAX,
        }
    }

    /// Budget left before the limit is reached
    pub fn total_free_bytes(&self) -> u64 {
        self.limit_bytes.saturating_sub(self.used_bytes)
    }
}

/// External source of capacity and process identity
pub trait CapacityOracle: Send + Sync {
    fn memory(&self) -> MemorySnapshot;

    fn process_id(&self) -> u32;
}

// =============================================================================
// System Oracle
// =============================================================================

/// Page size assumed when converting `/proc/self/statm` pages to bytes
const PAGE_SIZE: u64 = 4096;

/// Reads memory figures from `/proc` on Linux
///
/// Elsewhere, or if `/proc` is unreadable, reports an unbounded snapshot.
#[derive(Debug, Clone, Default)]
pub struct SystemOracle {
    /// Optional process budget; defaults to total system memory
    memory_limit: Option<u64>,
}

impl SystemOracle {
    pub fn new(memory_limit: Option<u64>) -> Self {
        Self { memory_limit }
    }

    fn read_snapshot(&self) -> Option<MemorySnapshot> {
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        let available = meminfo_field(&meminfo, "MemAvailable:")?;
        let total = meminfo_field(&meminfo, "MemTotal:")?;

        // statm: size resident shared text lib data dt (pages)
        let statm = fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        let used = resident_pages.saturating_mul(PAGE_SIZE);

        let limit = self.memory_limit.unwrap_or(total);
        let free = available.min(limit.saturating_sub(used));

        Some(MemorySnapshot {
            free_bytes: free,
            used_bytes: used,
            limit_bytes: limit,
        })
    }
}

impl CapacityOracle for SystemOracle {
    fn memory(&self) -> MemorySnapshot {
        self.read_snapshot().unwrap_or_else(MemorySnapshot::unbounded)
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }
}

/// Parse a `Name:   12345 kB` line from /proc/meminfo into bytes
fn meminfo_field(meminfo: &str, name: &str) -> Option<u64> {
    let line = meminfo.lines().find(|line| line.starts_with(name))?;
    let kb: u64 = line[name.len()..].split_whitespace().next()?.parse().ok()?;
    Some(kb.saturating_mul(1024))
}

// =============================================================================
// Fixed Oracle
// =============================================================================

/// Oracle with a settable snapshot, for tests and simulations
#[derive(Debug)]
pub struct FixedOracle {
    snapshot: Mutex<MemorySnapshot>,
    pid: u32,
}

impl FixedOracle {
    pub fn new(snapshot: MemorySnapshot, pid: u32) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            pid,
        }
    }

    /// Plenty of memory, given pid
    pub fn unbounded(pid: u32) -> Self {
        Self::new(MemorySnapshot::unbounded(), pid)
    }

    pub fn set(&self, snapshot: MemorySnapshot) {
        *self.snapshot.lock() = snapshot;
    }
}

impl CapacityOracle for FixedOracle {
    fn memory(&self) -> MemorySnapshot {
        *self.snapshot.lock()
    }

    fn process_id(&self) -> u32 {
        self.pid
    }
}
