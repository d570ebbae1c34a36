//! # udpkv
//!
//! A key-value store served over UDP with:
//! - CRC32-checked envelopes around every datagram
//! - Client retransmission with exponential backoff
//! - At-most-once execution through a bounded dedup cache
//! - Admission control against memory exhaustion
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Client Transport                          │
//! │            (retry + backoff, same message ID)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ UDP
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Server Transport                           │
//! │        (checksum check, dedup cache, reply framing)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ new message IDs only
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Admission  │◄─────────│ Dispatcher  │
//!   │  Controller │          │             │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │    Store    │
//!                           │  (RwLock)   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod dedup;
pub mod admission;
pub mod store;
pub mod dispatcher;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{ClientConfig, Config};
pub use dispatcher::{Dispatcher, Outcome};
pub use network::{KvClient, Server};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of udpkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
