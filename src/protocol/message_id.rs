//! Message identifiers
//!
//! A message ID names one logical request. Retransmissions reuse it; new
//! requests get a fresh one.
//!
//! ## Layout
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────────────┐
//! │ IPv4 (4) │ Port (2) │ Tag (2)  │  Timestamp ns (8)    │
//! └──────────┴──────────┴──────────┴──────────────────────┘
//! ```
//! Port, tag and timestamp are little-endian.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of a message ID on the wire
pub const MESSAGE_ID_LEN: usize = 16;

/// Constant tag mixed into every generated ID
pub const MESSAGE_ID_TAG: u16 = 0xAABB;

/// Last timestamp handed out by this process
static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Opaque 16-byte request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId([u8; MESSAGE_ID_LEN]);

impl MessageId {
    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; MESSAGE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a fresh ID for a request sent from `local`.
    ///
    /// Uniqueness is probabilistic across hosts and restarts. Within one
    /// process the timestamp component is strictly increasing.
    pub fn generate(local: SocketAddr) -> Self {
        let ip = match local.ip() {
            IpAddr::V4(v4) => v4.octets(),
            IpAddr::V6(v6) => {
                let o = v6.octets();
                [o[12], o[13], o[14], o[15]]
            }
        };

        let mut bytes = [0u8; MESSAGE_ID_LEN];
        bytes[0..4].copy_from_slice(&ip);
        bytes[4..6].copy_from_slice(&local.port().to_le_bytes());
        bytes[6..8].copy_from_slice(&MESSAGE_ID_TAG.to_le_bytes());
        bytes[8..16].copy_from_slice(&next_timestamp().to_le_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MESSAGE_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Wall-clock nanoseconds, bumped past the previous value if the clock
/// stalls or steps backwards
fn next_timestamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last.wrapping_add(1));
        match LAST_TIMESTAMP.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}
