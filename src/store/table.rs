//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::{KvError, Result};
use super::Record;

/// Bookkeeping overhead charged per record on top of key and value bytes
const RECORD_OVERHEAD: usize = std::mem::size_of::<i32>();

/// In-memory versioned key-value map
pub struct Store {
    data: RwLock<HashMap<Vec<u8>, Record>>,

    /// Approximate bytes held (keys + values + overhead)
    size: AtomicUsize,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a record by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Record> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a record (write lock)
    ///
    /// Fails with `OutOfMemory` if the map cannot grow; the store is left
    /// unchanged in that case.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>, version: i32) -> Result<()> {
        let mut data = self.data.write();

        data.try_reserve(1)
            .map_err(|e| KvError::OutOfMemory(format!("Store insert: {}", e)))?;

        let key_len = key.len();
        let value_len = value.len();

        match data.insert(key, Record { value, version }) {
            // Key bytes and overhead are already counted; swap the value
            Some(old) => {
                self.size.fetch_add(value_len, Ordering::Relaxed);
                self.size.fetch_sub(old.value.len(), Ordering::Relaxed);
            }
            None => {
                self.size
                    .fetch_add(key_len + value_len + RECORD_OVERHEAD, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    /// Remove a record (write lock). Returns the removed record, if any.
    pub fn remove(&self, key: &[u8]) -> Option<Record> {
        let mut data = self.data.write();
        let removed = data.remove(key)?;
        self.size
            .fetch_sub(record_size(key, &removed.value), Ordering::Relaxed);
        Some(removed)
    }

    /// Remove every record. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut data = self.data.write();
        let count = data.len();
        data.clear();
        data.shrink_to_fit();
        self.size.store(0, Ordering::Relaxed);
        count
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

fn record_size(key: &[u8], value: &[u8]) -> usize {
    key.len() + value.len() + RECORD_OVERHEAD
}

