//! Command definitions
//!
//! Represents commands from clients.

use serde::{Deserialize, Serialize};

/// Command codes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandType {
    Put = 0x01,
    Get = 0x02,
    Remove = 0x03,
    Shutdown = 0x04,
    Wipeout = 0x05,
    IsAlive = 0x06,
    GetPid = 0x07,
    GetMembershipCount = 0x08,
}

impl CommandType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x01 => Some(CommandType::Put),
            0x02 => Some(CommandType::Get),
            0x03 => Some(CommandType::Remove),
            0x04 => Some(CommandType::Shutdown),
            0x05 => Some(CommandType::Wipeout),
            0x06 => Some(CommandType::IsAlive),
            0x07 => Some(CommandType::GetPid),
            0x08 => Some(CommandType::GetMembershipCount),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a value under a key
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        version: i32,
    },

    /// Fetch a value by key
    Get { key: Vec<u8> },

    /// Delete a key
    Remove { key: Vec<u8> },

    /// Terminate the server process
    Shutdown,

    /// Drop every record
    Wipeout,

    /// Liveness probe
    IsAlive,

    /// Ask for the server's process ID
    GetPid,

    /// Ask for the number of cluster members
    GetMembershipCount,

    /// A code this server does not implement
    Unknown(u32),
}

impl Command {
    /// Numeric code sent on the wire
    pub fn code(&self) -> u32 {
        match self {
            Command::Put { .. } => CommandType::Put as u32,
            Command::Get { .. } => CommandType::Get as u32,
            Command::Remove { .. } => CommandType::Remove as u32,
            Command::Shutdown => CommandType::Shutdown as u32,
            Command::Wipeout => CommandType::Wipeout as u32,
            Command::IsAlive => CommandType::IsAlive as u32,
            Command::GetPid => CommandType::GetPid as u32,
            Command::GetMembershipCount => CommandType::GetMembershipCount as u32,
            Command::Unknown(code) => *code,
        }
    }

    /// True for commands that may grow the store
    pub fn consumes_capacity(&self) -> bool {
        matches!(self, Command::Put { .. })
    }
}

/// Wire shape of a command
///
/// All fields but `command` are optional on the wire. Missing fields decode
/// to an empty key, an empty value, and version 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command: u32,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
    pub version: Option<i32>,
}

impl From<&Command> for CommandMessage {
    fn from(command: &Command) -> Self {
        let mut message = CommandMessage {
            command: command.code(),
            ..Default::default()
        };
        match command {
            Command::Put {
                key,
                value,
                version,
            } => {
                message.key = Some(key.clone());
                message.value = Some(value.clone());
                message.version = Some(*version);
            }
            Command::Get { key } | Command::Remove { key } => {
                message.key = Some(key.clone());
            }
            _ => {}
        }
        message
    }
}

impl From<CommandMessage> for Command {
    fn from(message: CommandMessage) -> Self {
        let key = message.key.unwrap_or_default();
        match CommandType::from_code(message.command) {
            Some(CommandType::Put) => Command::Put {
                key,
                value: message.value.unwrap_or_default(),
                version: message.version.unwrap_or(0),
            },
            Some(CommandType::Get) => Command::Get { key },
            Some(CommandType::Remove) => Command::Remove { key },
            Some(CommandType::Shutdown) => Command::Shutdown,
            Some(CommandType::Wipeout) => Command::Wipeout,
            Some(CommandType::IsAlive) => Command::IsAlive,
            Some(CommandType::GetPid) => Command::GetPid,
            Some(CommandType::GetMembershipCount) => Command::GetMembershipCount,
            None => Command::Unknown(message.command),
        }
    }
}
