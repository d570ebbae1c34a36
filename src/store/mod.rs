//! Store Module
//!
//! In-memory key-value map behind the dispatcher.
//!
//! ## Responsibilities
//! - Put/get/remove/clear of versioned records
//! - Many concurrent readers, one writer at a time
//! - Approximate size tracking for diagnostics
//!
//! ## Data Structure Choice
//! `HashMap` wrapped in a `parking_lot::RwLock`. No ordering is needed since
//! nothing is ever flushed or scanned.

mod table;

pub use table::Store;

/// Value and version stored under a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub value: Vec<u8>,
    pub version: i32,
}
