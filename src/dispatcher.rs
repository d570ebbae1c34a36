//! Dispatcher Module
//!
//! Interprets decoded commands against the store.
//!
//! ## Responsibilities
//! - Route each command to its handler
//! - Enforce key/value size limits
//! - Consult admission control before capacity-consuming commands
//! - Turn residual allocation failures into `GeneralFail`
//! - Report `Shutdown` as a terminal outcome instead of exiting

use crate::admission::AdmissionController;
use crate::config::Config;
use crate::protocol::{decode_command, Command, ErrCode, Response};
use crate::store::Store;

/// Membership count reported by a single-node deployment
pub const MEMBERSHIP_COUNT: i32 = 1;

/// What the server should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this response
    Reply(Response),

    /// Stop serving and exit the process; nothing is sent
    Shutdown,
}

/// Executes commands against the key-value store
pub struct Dispatcher {
    store: Store,
    admission: AdmissionController,
    max_key_len: usize,
    max_value_len: usize,
}

impl Dispatcher {
    pub fn new(config: &Config, admission: AdmissionController) -> Self {
        Self {
            store: Store::new(),
            admission,
            max_key_len: config.max_key_len,
            max_value_len: config.max_value_len,
        }
    }

    /// Decode and execute a request payload
    ///
    /// A payload that does not decode as a command yields `GeneralFail`.
    pub fn handle_payload(&self, payload: &[u8]) -> Outcome {
        match decode_command(payload) {
            Ok(command) => self.execute(command),
            Err(e) => {
                tracing::debug!("Could not decode command: {}", e);
                Outcome::Reply(Response::status(ErrCode::GeneralFail))
            }
        }
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Outcome {
        tracing::trace!("Executing command {:?}", command.code());

        if command.consumes_capacity() && !self.admission.has_storage_headroom() {
            tracing::warn!("Rejecting command {}: no storage headroom", command.code());
            return Outcome::Reply(Response::status(ErrCode::NoSpace));
        }

        let response = match command {
            Command::Put {
                key,
                value,
                version,
            } => self.put(key, value, version),
            Command::Get { key } => self.get(&key),
            Command::Remove { key } => self.remove(&key),
            Command::Wipeout => {
                let removed = self.store.clear();
                tracing::info!("Wipeout removed {} records", removed);
                Response::success()
            }
            Command::IsAlive => Response::success(),
            Command::GetPid => self.pid(),
            Command::GetMembershipCount => Response::membership_count(MEMBERSHIP_COUNT),
            Command::Shutdown => {
                tracing::info!("Shutdown command received");
                return Outcome::Shutdown;
            }
            Command::Unknown(code) => {
                tracing::debug!("Unsupported command code {}", code);
                Response::status(ErrCode::NoCmd)
            }
        };

        Outcome::Reply(response)
    }

    /// Store a value
    ///
    /// Storage headroom was checked by `execute`; key length comes next,
    /// then value length.
    fn put(&self, key: Vec<u8>, value: Vec<u8>, version: i32) -> Response {
        if key.len() > self.max_key_len {
            return Response::status(ErrCode::InvalKey);
        }
        if value.len() > self.max_value_len {
            return Response::status(ErrCode::InvalVal);
        }

        match self.store.put(key, value, version) {
            Ok(()) => Response::success(),
            Err(e) => {
                tracing::warn!("PUT failed: {}", e);
                Response::status(ErrCode::GeneralFail)
            }
        }
    }

    /// Fetch a value
    fn get(&self, key: &[u8]) -> Response {
        if key.len() > self.max_key_len {
            return Response::status(ErrCode::InvalKey);
        }

        match self.store.get(key) {
            Some(record) => Response::value(record.value, record.version),
            None => Response::status(ErrCode::NoKey),
        }
    }

    /// Report the process ID, which travels as an i32
    fn pid(&self) -> Response {
        let pid = self.admission.process_id();
        match i32::try_from(pid) {
            Ok(pid) => Response::pid(pid),
            Err(_) => {
                tracing::warn!("Process ID {} does not fit the wire field", pid);
                Response::status(ErrCode::GeneralFail)
            }
        }
    }

    /// Delete a value
    fn remove(&self, key: &[u8]) -> Response {
        match self.store.remove(key) {
            Some(_) => Response::success(),
            None => Response::status(ErrCode::NoKey),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }
}
