//! Network Module
//!
//! UDP transports, server, and client.
//!
//! ## Architecture
//! - One UDP socket shared by a pool of worker threads
//! - Duplicate suppression in the server transport
//! - Commands routed through the Dispatcher
//! - Client retries with exponential backoff

mod transport;
mod server;
mod client;

pub use transport::{InboundRequest, ServerTransport};
pub use server::{ServeExit, Server, ServerHandle};
pub use client::{ClientTransport, KvClient};
