//! Admission Controller Tests
//!
//! Tests verify:
//! - Operating headroom threshold
//! - Storage headroom thresholds (free and total budget)
//! - Snapshot changes are observed on the next check

use std::sync::Arc;

use udpkv::admission::{AdmissionController, CapacityOracle, FixedOracle, MemorySnapshot};
use udpkv::config::AdmissionThresholds;

// =============================================================================
// Helper Functions
// =============================================================================

fn snapshot(free: u64, used: u64, limit: u64) -> MemorySnapshot {
    MemorySnapshot {
        free_bytes: free,
        used_bytes: used,
        limit_bytes: limit,
    }
}

fn setup(snap: MemorySnapshot) -> (Arc<FixedOracle>, AdmissionController) {
    let oracle = Arc::new(FixedOracle::new(snap, 77));
    let controller = AdmissionController::new(oracle.clone(), AdmissionThresholds::default());
    (oracle, controller)
}

// =============================================================================
// Operating Headroom Tests
// =============================================================================

#[test]
fn test_operating_headroom_with_plenty_of_memory() {
    let (_oracle, controller) = setup(MemorySnapshot::unbounded());
    assert!(controller.has_operating_headroom());
    assert!(controller.has_storage_headroom());
}

#[test]
fn test_operating_headroom_threshold_is_strict() {
    let (_oracle, controller) = setup(snapshot(100_000, 0, u64::MAX));
    assert!(!controller.has_operating_headroom());

    let (_oracle, controller) = setup(snapshot(100_001, 0, u64::MAX));
    assert!(controller.has_operating_headroom());
}

// =============================================================================
// Storage Headroom Tests
// =============================================================================

#[test]
fn test_storage_headroom_needs_free_memory() {
    // Operating is fine, storage is not
    let (_oracle, controller) = setup(snapshot(500_000, 0, u64::MAX));
    assert!(controller.has_operating_headroom());
    assert!(!controller.has_storage_headroom());
}

#[test]
fn test_storage_headroom_needs_total_budget() {
    // Plenty free right now, but the budget is nearly used up
    let (_oracle, controller) = setup(snapshot(5_000_000, 9_000_000, 10_000_000));
    assert!(!controller.has_storage_headroom());

    let (_oracle, controller) = setup(snapshot(5_000_000, 7_000_000, 10_000_000));
    assert!(controller.has_storage_headroom());
}

#[test]
fn test_checks_follow_oracle_updates() {
    let (oracle, controller) = setup(MemorySnapshot::unbounded());
    assert!(controller.has_storage_headroom());

    oracle.set(snapshot(50_000, 0, u64::MAX));
    assert!(!controller.has_operating_headroom());
    assert!(!controller.has_storage_headroom());

    oracle.set(MemorySnapshot::unbounded());
    assert!(controller.has_operating_headroom());
}

#[test]
fn test_custom_thresholds() {
    let oracle = Arc::new(FixedOracle::new(snapshot(10, 0, 100), 1));
    let thresholds = AdmissionThresholds {
        operating_free_min: 5,
        storage_free_min: 8,
        storage_total_free_min: 50,
    };
    let controller = AdmissionController::new(oracle, thresholds);

    assert!(controller.has_operating_headroom());
    assert!(controller.has_storage_headroom());
    assert_eq!(controller.thresholds(), &thresholds);
}

#[test]
fn test_process_id_comes_from_oracle() {
    let (oracle, controller) = setup(MemorySnapshot::unbounded());
    assert_eq!(controller.process_id(), 77);
    assert_eq!(oracle.process_id(), 77);
}

#[test]
fn test_total_free_saturates() {
    let snap = snapshot(0, 200, 100);
    assert_eq!(snap.total_free_bytes(), 0);
}
