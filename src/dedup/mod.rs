//! Dedup Module
//!
//! Remembers recently seen message IDs so a retransmitted request is
//! answered from cache instead of being executed again.
//!
//! ## Entry Lifecycle
//! ```text
//!   first receipt          reply()
//!  ───────────────► Pending ───────► Resolved ──┐
//!                     │                  ▲      │ duplicate receipt:
//!                     │ duplicate        └──────┘ resend cached bytes
//!                     ▼ receipt: drop
//! ```
//!
//! Entries leave the cache when it is over capacity (least recently
//! accessed first) or once they have been idle longer than the TTL. Both
//! bounds apply independently.

mod cache;

pub use cache::DedupCache;

use std::net::SocketAddr;

use bytes::Bytes;

/// State of a remembered request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupState {
    /// Accepted and being dispatched; no response yet
    Pending,

    /// Answered; holds the response payload
    Resolved(Bytes),
}

/// Outcome of offering a message ID to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Never seen (or forgotten); a pending entry now exists
    New,

    /// Same ID is still being dispatched
    InFlight,

    /// Already answered; resend this payload
    Replay(Bytes),
}
