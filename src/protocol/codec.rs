//! Protocol codec
//!
//! Encoding and decoding of the application messages carried inside an
//! envelope payload.
//!
//! Messages are bincode-serialized with varint integers. Decoding rejects
//! trailing bytes and anything larger than a datagram.

use bincode::Options;

use crate::error::Result;
use super::{Command, CommandMessage, Response, MAX_DATAGRAM_SIZE};

/// Shared bincode settings for every message on the wire
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_DATAGRAM_SIZE as u64)
        .reject_trailing_bytes()
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a raw command message
pub fn encode_message(message: &CommandMessage) -> Result<Vec<u8>> {
    Ok(wire_options().serialize(message)?)
}

/// Decode a raw command message, keeping absent fields absent
pub fn decode_message(bytes: &[u8]) -> Result<CommandMessage> {
    Ok(wire_options().deserialize(bytes)?)
}

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    encode_message(&CommandMessage::from(command))
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    decode_message(bytes).map(Command::from)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    Ok(wire_options().serialize(response)?)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    Ok(wire_options().deserialize(bytes)?)
}
