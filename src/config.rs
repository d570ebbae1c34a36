//! Configuration for udpkv
//!
//! Centralized configuration with sensible defaults. The defaults mirror the
//! reference deployment: 32-byte keys, 10000-byte values, a 100-entry dedup
//! cache with a 5 second TTL, and a client that retries 3 times starting at
//! 100 ms.

use std::time::Duration;

use crate::error::{KvError, Result};

/// Largest key accepted by PUT/GET (bytes)
pub const DEFAULT_MAX_KEY_LEN: usize = 32;

/// Largest value accepted by PUT (bytes)
pub const DEFAULT_MAX_VALUE_LEN: usize = 10_000;

/// Main configuration for a udpkv server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// UDP listen address
    pub listen_addr: String,

    /// Number of worker threads sharing the socket
    pub workers: usize,

    /// Socket read timeout; workers check the stop flag at this interval
    pub poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    pub max_key_len: usize,

    pub max_value_len: usize,

    // -------------------------------------------------------------------------
    // Dedup Cache Configuration
    // -------------------------------------------------------------------------
    /// Max remembered message IDs before LRU eviction
    pub dedup_max_entries: usize,

    /// Inactivity period after which a message ID is forgotten (milliseconds)
    pub dedup_ttl_ms: u64,

    // -------------------------------------------------------------------------
    // Admission Control Configuration
    // -------------------------------------------------------------------------
    pub admission: AdmissionThresholds,

    /// Memory budget for the process (bytes). `None` uses total system memory.
    pub memory_limit: Option<u64>,
}

/// Headroom thresholds consulted by the admission controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionThresholds {
    /// Free bytes required to dispatch anything at all
    pub operating_free_min: u64,

    /// Free bytes required before a capacity-consuming command
    pub storage_free_min: u64,

    /// Remaining budget (limit - used) required before a capacity-consuming command
    pub storage_total_free_min: u64,
}

impl Default for AdmissionThresholds {
    fn default() -> Self {
        Self {
            operating_free_min: 100_000,
            storage_free_min: 1_000_000,
            storage_total_free_min: 2_000_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4445".to_string(),
            workers: 1,
            poll_interval_ms: 250,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
            dedup_max_entries: 100,
            dedup_ttl_ms: 5000,
            admission: AdmissionThresholds::default(),
            memory_limit: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_millis(self.dedup_ttl_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(KvError::Config("workers must be at least 1".to_string()));
        }
        if self.dedup_max_entries == 0 {
            return Err(KvError::Config(
                "dedup_max_entries must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(KvError::Config(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the UDP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the stop-flag poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the key-size limit (in bytes)
    pub fn max_key_len(mut self, len: usize) -> Self {
        self.config.max_key_len = len;
        self
    }

    /// Set the value-size limit (in bytes)
    pub fn max_value_len(mut self, len: usize) -> Self {
        self.config.max_value_len = len;
        self
    }

    /// Set the dedup cache capacity
    pub fn dedup_max_entries(mut self, count: usize) -> Self {
        self.config.dedup_max_entries = count;
        self
    }

    /// Set the dedup inactivity TTL (in milliseconds)
    pub fn dedup_ttl_ms(mut self, ms: u64) -> Self {
        self.config.dedup_ttl_ms = ms;
        self
    }

    /// Set the admission-control thresholds
    pub fn admission(mut self, thresholds: AdmissionThresholds) -> Self {
        self.config.admission = thresholds;
        self
    }

    /// Set the process memory budget (in bytes)
    pub fn memory_limit(mut self, bytes: Option<u64>) -> Self {
        self.config.memory_limit = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Retry policy for the client transport
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retransmissions after the initial send
    pub max_retries: u32,

    /// Wait before the first retransmission (milliseconds)
    pub initial_timeout_ms: u64,

    /// Ceiling for the doubled wait (milliseconds)
    pub max_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_timeout_ms: 100,
            max_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Per-attempt wait times: the initial timeout, doubled after every
    /// attempt and capped at the ceiling. Yields `max_retries + 1` values.
    pub fn timeouts(&self) -> impl Iterator<Item = Duration> {
        let ceiling = self.max_timeout_ms;
        let mut next = self.initial_timeout_ms.min(ceiling);
        (0..=self.max_retries).map(move |_| {
            let current = next;
            next = next.saturating_mul(2).min(ceiling);
            Duration::from_millis(current)
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_timeout_ms == 0 {
            return Err(KvError::Config(
                "initial_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.initial_timeout_ms > self.max_timeout_ms {
            return Err(KvError::Config(format!(
                "initial timeout {}ms exceeds ceiling {}ms",
                self.initial_timeout_ms, self.max_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn initial_timeout_ms(mut self, ms: u64) -> Self {
        self.config.initial_timeout_ms = ms;
        self
    }

    pub fn max_timeout_ms(mut self, ms: u64) -> Self {
        self.config.max_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
