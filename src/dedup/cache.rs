//! Dedup cache implementation
//!
//! LRU-ordered map with lazy TTL expiry. Every method that reads or writes
//! an entry takes `now` so expiry is testable without sleeping.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;

use crate::error::{KvError, Result};
use crate::protocol::MessageId;
use super::{Admission, DedupState};

#[derive(Debug)]
struct DedupEntry {
    /// Address that sent the first copy. Diagnostic only: replays go to
    /// whoever sent the duplicate.
    requester: SocketAddr,
    state: DedupState,
    last_access: Instant,
}

impl DedupEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_access) > ttl
    }
}

/// Bounded, time-expiring map of message ID to response
///
/// ## Concurrency
/// Not thread-safe on its own; the server transport wraps it in a mutex.
pub struct DedupCache {
    entries: LruCache<MessageId, DedupEntry>,
    ttl: Duration,
}

impl DedupCache {
    /// Create a cache holding at most `max_entries` IDs (minimum 1)
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Offer a freshly received ID
    ///
    /// - miss: records a pending entry for `requester`, returns `New`
    /// - pending hit: returns `InFlight`
    /// - resolved hit: returns `Replay` with the cached payload
    ///
    /// Hits refresh the entry's access time and LRU position.
    pub fn admit(&mut self, id: MessageId, requester: SocketAddr, now: Instant) -> Admission {
        match self.lookup(&id, now) {
            Some(DedupState::Pending) => Admission::InFlight,
            Some(DedupState::Resolved(response)) => Admission::Replay(response),
            None => {
                self.insert(id, requester, DedupState::Pending, now);
                Admission::New
            }
        }
    }

    /// Look up an ID, refreshing it on a hit
    ///
    /// Entries idle past the TTL are removed and reported as absent.
    pub fn lookup(&mut self, id: &MessageId, now: Instant) -> Option<DedupState> {
        let ttl = self.ttl;
        match self.entries.get_mut(id) {
            None => return None,
            Some(entry) if !entry.is_expired(now, ttl) => {
                entry.last_access = now;
                return Some(entry.state.clone());
            }
            Some(_) => {}
        }

        self.entries.pop(id);
        tracing::trace!("Dedup entry {} expired", id);
        None
    }

    /// Store the response for an ID, moving it to `Resolved`
    ///
    /// An entry evicted while its request was being dispatched is
    /// re-created as resolved. Resolving an already-resolved ID is an error.
    pub fn resolve(
        &mut self,
        id: MessageId,
        requester: SocketAddr,
        response: Bytes,
        now: Instant,
    ) -> Result<()> {
        if let Some(entry) = self.entries.get_mut(&id) {
            if let DedupState::Resolved(_) = entry.state {
                return Err(KvError::NoPendingRequest(id.to_string()));
            }
            entry.state = DedupState::Resolved(response);
            entry.requester = requester;
            entry.last_access = now;
            return Ok(());
        }

        tracing::debug!("Dedup entry {} was evicted before reply; re-inserting", id);
        self.insert(id, requester, DedupState::Resolved(response), now);
        Ok(())
    }

    /// Forget a pending ID without answering it
    ///
    /// Returns false if the ID was absent or already resolved (resolved
    /// entries are kept).
    pub fn release(&mut self, id: &MessageId) -> bool {
        match self.entries.peek(id) {
            Some(entry) if entry.state == DedupState::Pending => {
                self.entries.pop(id);
                true
            }
            _ => false,
        }
    }

    /// Drop every entry idle longer than the TTL
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired: Vec<MessageId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, ttl))
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            self.entries.pop(id);
        }
        expired.len()
    }

    /// Requester recorded for an ID (does not refresh the entry)
    ///
    /// For diagnostics; reply routing never reads it.
    pub fn requester(&self, id: &MessageId) -> Option<SocketAddr> {
        self.entries.peek(id).map(|entry| entry.requester)
    }

    /// True if the ID is present, expired or not (does not refresh it)
    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn insert(&mut self, id: MessageId, requester: SocketAddr, state: DedupState, now: Instant) {
        let entry = DedupEntry {
            requester,
            state,
            last_access: now,
        };
        if let Some((evicted, _)) = self.entries.push(id, entry) {
            if evicted != id {
                tracing::trace!("Dedup cache full; evicted {}", evicted);
            }
        }
    }
}
