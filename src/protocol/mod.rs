//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Datagram Format
//!
//! ```text
//! ┌──────────────────┬──────────────────────┬──────────────┐
//! │ Message ID (16)  │   Payload (0..16364) │ CRC32 (4)    │
//! └──────────────────┴──────────────────────┴──────────────┘
//! ```
//! The CRC32 covers the message ID and the payload. The payload is a
//! bincode-encoded command (requests) or response (replies).
//!
//! ### Commands
//! - 0x01: PUT       - key, value, version
//! - 0x02: GET       - key
//! - 0x03: REMOVE    - key
//! - 0x04: SHUTDOWN
//! - 0x05: WIPEOUT
//! - 0x06: IS_ALIVE
//! - 0x07: GET_PID
//! - 0x08: GET_MEMBERSHIP_COUNT
//!
//! ### Error Codes
//! - 0: Success
//! - 1: NoKey
//! - 2: NoSpace
//! - 3: Overload
//! - 4: GeneralFail
//! - 5: NoCmd
//! - 6: InvalKey
//! - 7: InvalVal

mod message_id;
mod envelope;
mod command;
mod response;
mod codec;

pub use message_id::{MessageId, MESSAGE_ID_LEN, MESSAGE_ID_TAG};
pub use envelope::{compute_checksum, Envelope, CHECKSUM_LEN, MAX_PAYLOAD_SIZE, MIN_ENVELOPE_SIZE};
pub use command::{Command, CommandMessage, CommandType};
pub use response::{ErrCode, Response};
pub use codec::{
    decode_command, decode_message, decode_response, encode_command, encode_message,
    encode_response,
};

/// Maximum datagram size (16 KiB)
pub const MAX_DATAGRAM_SIZE: usize = 16 * 1024;
