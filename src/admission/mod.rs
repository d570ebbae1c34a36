//! Admission Control Module
//!
//! Decides, before any memory-consuming work, whether the process has room
//! for it.
//!
//! ## Checks
//! - **Operating headroom**: free memory above a small floor. Failing it
//!   rejects every request with `Overload`.
//! - **Storage headroom**: free memory and remaining budget above larger
//!   floors. Failing it rejects PUT with `NoSpace`.
//!
//! Both checks are read-only snapshots of a [`CapacityOracle`].

mod oracle;

pub use oracle::{CapacityOracle, FixedOracle, MemorySnapshot, SystemOracle};

use std::sync::Arc;

use crate::config::AdmissionThresholds;

/// Admission gate in front of the dispatcher
#[derive(Clone)]
pub struct AdmissionController {
    oracle: Arc<dyn CapacityOracle>,
    thresholds: AdmissionThresholds,
}

impl AdmissionController {
    pub fn new(oracle: Arc<dyn CapacityOracle>, thresholds: AdmissionThresholds) -> Self {
        Self { oracle, thresholds }
    }

    /// Enough free memory to dispatch any request at all
    pub fn has_operating_headroom(&self) -> bool {
        self.oracle.memory().free_bytes > self.thresholds.operating_free_min
    }

    /// Enough free memory and budget to store more data
    pub fn has_storage_headroom(&self) -> bool {
        let snapshot = self.oracle.memory();
        snapshot.free_bytes > self.thresholds.storage_free_min
            && snapshot.total_free_bytes() > self.thresholds.storage_total_free_min
    }

    /// Process ID reported by the oracle
    pub fn process_id(&self) -> u32 {
        self.oracle.process_id()
    }

    pub fn thresholds(&self) -> &AdmissionThresholds {
        &self.thresholds
    }
}
