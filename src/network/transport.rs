//! Server Transport
//!
//! Receives envelopes, filters corrupt datagrams and duplicates, and sends
//! framed replies.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::dedup::{Admission, DedupCache};
use crate::error::Result;
use crate::protocol::{Envelope, MessageId, MAX_DATAGRAM_SIZE};

/// A request accepted for dispatch
///
/// Carries everything needed to answer it, so concurrent requests never
/// share reply state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub id: MessageId,
    pub requester: SocketAddr,
    pub payload: Bytes,
}

/// UDP endpoint with duplicate suppression
///
/// All methods take `&self`; the socket is shared and the dedup cache sits
/// behind a mutex, so several workers can serve from one transport.
pub struct ServerTransport {
    socket: UdpSocket,
    cache: Mutex<DedupCache>,
    local_addr: SocketAddr,
}

impl ServerTransport {
    /// Bind a UDP socket and attach an empty dedup cache
    pub fn bind(addr: impl ToSocketAddrs, max_entries: usize, ttl: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        Self::from_socket(socket, DedupCache::new(max_entries, ttl))
    }

    /// Wrap an already-bound socket
    pub fn from_socket(socket: UdpSocket, cache: DedupCache) -> Result<Self> {
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            cache: Mutex::new(cache),
            local_addr,
        })
    }

    /// Configure how long `receive` blocks (None blocks forever)
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Read one datagram
    ///
    /// Returns `Some` only for a valid envelope with a message ID not seen
    /// before (or forgotten). Corrupt datagrams and in-flight duplicates
    /// are dropped; duplicates of answered requests are answered from the
    /// cache. All of those return `None`.
    ///
    /// A socket read timeout surfaces as an `Io` error.
    pub fn receive(&self) -> Result<Option<InboundRequest>> {
        // One spare byte so an oversize datagram is seen as oversize
        // rather than silently truncated
        let mut buf = [0u8; MAX_DATAGRAM_SIZE + 1];
        let (len, peer) = self.socket.recv_from(&mut buf)?;

        let envelope = match Envelope::decode_verified(&buf[..len]) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!("Dropping datagram from {}: {}", peer, e);
                return Ok(None);
            }
        };

        let admission = self.cache.lock().admit(envelope.id, peer, Instant::now());

        match admission {
            Admission::New => {
                tracing::trace!("Accepted request {} from {}", envelope.id, peer);
                Ok(Some(InboundRequest {
                    id: envelope.id,
                    requester: peer,
                    payload: envelope.payload,
                }))
            }
            Admission::InFlight => {
                tracing::debug!("Dropping duplicate of in-flight request {}", envelope.id);
                Ok(None)
            }
            Admission::Replay(response) => {
                tracing::debug!("Replaying cached response for {} to {}", envelope.id, peer);
                if let Err(e) = self.send_framed(envelope.id, response, peer) {
                    tracing::warn!("Error replaying response to {}: {}", peer, e);
                }
                Ok(None)
            }
        }
    }

    /// Answer an accepted request and cache the answer
    ///
    /// Fails with `NoPendingRequest` if the request was already answered.
    pub fn reply(&self, request: &InboundRequest, payload: Bytes) -> Result<()> {
        let datagram = Envelope::new(request.id, payload.clone()).encode()?;
        self.cache
            .lock()
            .resolve(request.id, request.requester, payload, Instant::now())?;
        self.socket.send_to(&datagram, request.requester)?;
        Ok(())
    }

    /// Answer an accepted request without caching the answer
    ///
    /// The pending entry is released, so a later retransmission of the same
    /// ID is treated as new. Used for rejections that did not dispatch.
    pub fn reject(&self, request: &InboundRequest, payload: Bytes) -> Result<()> {
        self.cache.lock().release(&request.id);
        self.send_framed(request.id, payload, request.requester)
    }

    /// Drop dedup entries idle past the TTL
    pub fn purge_expired(&self) -> usize {
        self.cache.lock().purge_expired(Instant::now())
    }

    /// Number of remembered message IDs
    pub fn cached_requests(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send_framed(&self, id: MessageId, payload: Bytes, to: SocketAddr) -> Result<()> {
        let datagram = Envelope::new(id, payload).encode()?;
        self.socket.send_to(&datagram, to)?;
        Ok(())
    }
}

/// True for the errors a socket read timeout produces
pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
