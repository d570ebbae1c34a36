//! Error types for udpkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for udpkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Datagram too large: {size} bytes (max {max})")]
    OversizedDatagram { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Allocation failed: {0}")]
    OutOfMemory(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("No pending request for message {0}")]
    NoPendingRequest(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for KvError {
    fn from(err: bincode::Error) -> Self {
        KvError::MalformedMessage(err.to_string())
    }
}

impl KvError {
    /// True for the errors a server drops silently instead of answering
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            KvError::MalformedMessage(_)
                | KvError::ChecksumMismatch { .. }
                | KvError::OversizedDatagram { .. }
        )
    }
}
