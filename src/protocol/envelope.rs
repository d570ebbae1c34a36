//! Envelope framing
//!
//! The transport frame around every request and response.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};
use super::{MessageId, MAX_DATAGRAM_SIZE, MESSAGE_ID_LEN};

/// Checksum trailer size
pub const CHECKSUM_LEN: usize = 4;

/// Smallest valid envelope: an ID, an empty payload, and the checksum
pub const MIN_ENVELOPE_SIZE: usize = MESSAGE_ID_LEN + CHECKSUM_LEN;

/// Largest payload that fits in one datagram
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_SIZE - MIN_ENVELOPE_SIZE;

/// CRC32 over `id || payload`
pub fn compute_checksum(id: &MessageId, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(id.as_bytes());
    hasher.update(payload);
    hasher.finalize()
}

/// A framed message: ID, opaque payload, checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: MessageId,
    pub payload: Bytes,
    pub checksum: u32,
}

impl Envelope {
    /// Frame a payload, computing its checksum
    pub fn new(id: MessageId, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let checksum = compute_checksum(&id, &payload);
        Self {
            id,
            payload,
            checksum,
        }
    }

    /// True when the carried checksum matches the ID and payload
    pub fn is_valid(&self) -> bool {
        compute_checksum(&self.id, &self.payload) == self.checksum
    }

    /// Fail with `ChecksumMismatch` unless the checksum holds
    pub fn verify(&self) -> Result<()> {
        let actual = compute_checksum(&self.id, &self.payload);
        if actual != self.checksum {
            return Err(KvError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }

    /// Encode to a datagram
    ///
    /// Format: message_id (16) + payload + checksum (4, big-endian)
    pub fn encode(&self) -> Result<Bytes> {
        let size = MIN_ENVELOPE_SIZE + self.payload.len();
        if size > MAX_DATAGRAM_SIZE {
            return Err(KvError::OversizedDatagram {
                size,
                max: MAX_DATAGRAM_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(size);
        buf.put_slice(self.id.as_bytes());
        buf.put_slice(&self.payload);
        buf.put_u32(self.checksum);
        Ok(buf.freeze())
    }

    /// Decode a datagram without checking the checksum
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(KvError::OversizedDatagram {
                size: bytes.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        if bytes.len() < MIN_ENVELOPE_SIZE {
            return Err(KvError::MalformedMessage(format!(
                "Envelope too short: expected at least {} bytes, got {}",
                MIN_ENVELOPE_SIZE,
                bytes.len()
            )));
        }

        let payload_end = bytes.len() - CHECKSUM_LEN;

        let mut id = [0u8; MESSAGE_ID_LEN];
        id.copy_from_slice(&bytes[..MESSAGE_ID_LEN]);

        let checksum = u32::from_be_bytes([
            bytes[payload_end],
            bytes[payload_end + 1],
            bytes[payload_end + 2],
            bytes[payload_end + 3],
        ]);

        Ok(Self {
            id: MessageId::from_bytes(id),
            payload: Bytes::copy_from_slice(&bytes[MESSAGE_ID_LEN..payload_end]),
            checksum,
        })
    }

    /// Decode a datagram and reject it unless the checksum holds
    pub fn decode_verified(bytes: &[u8]) -> Result<Self> {
        let envelope = Self::decode(bytes)?;
        envelope.verify()?;
        Ok(envelope)
    }
}
