//! Client Transport
//!
//! Sends a request and waits for its reply, retransmitting with
//! exponential backoff.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{KvError, Result};
use crate::protocol::{
    decode_response, encode_command, Command, Envelope, MessageId, Response, MAX_DATAGRAM_SIZE,
};
use super::transport::is_timeout;

/// Reliable request/response over UDP
pub struct ClientTransport {
    socket: UdpSocket,
    config: ClientConfig,
}

impl ClientTransport {
    /// Bind an ephemeral local socket
    pub fn bind(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self { socket, config })
    }

    /// Use an already-bound socket
    pub fn with_socket(socket: UdpSocket, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { socket, config })
    }

    /// Send `payload` to `destination` and return the reply payload
    ///
    /// Every attempt transmits the same datagram, so the server sees one
    /// message ID for the whole exchange. Fails with `Timeout` after
    /// `max_retries` retransmissions go unanswered.
    pub fn send(&self, payload: &[u8], destination: SocketAddr) -> Result<Bytes> {
        let id = MessageId::generate(self.source_addr(destination)?);
        let datagram = Envelope::new(id, Bytes::copy_from_slice(payload)).encode()?;

        let mut attempts = 0;
        for timeout in self.config.timeouts() {
            if attempts > 0 {
                tracing::debug!(
                    "Request {} timed out; resending (attempt {}, waiting {:?})",
                    id,
                    attempts + 1,
                    timeout
                );
            }
            self.socket.send_to(&datagram, destination)?;
            attempts += 1;

            if let Some(reply) = self.await_reply(&id, timeout)? {
                return Ok(reply);
            }
        }

        tracing::warn!("Request {} to {} timed out after {} attempts", id, destination, attempts);
        Err(KvError::Timeout { attempts })
    }

    /// Address the destination will see this client as
    ///
    /// A socket bound to the wildcard address reports `0.0.0.0`; the
    /// concrete IP comes from the route to `destination`, found by
    /// connecting a throwaway socket (nothing is sent).
    fn source_addr(&self, destination: SocketAddr) -> Result<SocketAddr> {
        let local = self.socket.local_addr()?;
        if !local.ip().is_unspecified() {
            return Ok(local);
        }

        let wildcard = match destination.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let route = UdpSocket::bind(SocketAddr::new(wildcard, 0))?;
        route.connect(destination)?;
        Ok(SocketAddr::new(route.local_addr()?.ip(), local.port()))
    }

    /// Wait up to `timeout` for a valid reply carrying `id`
    ///
    /// Stray datagrams are ignored and do not extend the wait.
    fn await_reply(&self, id: &MessageId, timeout: Duration) -> Result<Option<Bytes>> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; MAX_DATAGRAM_SIZE + 1];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            self.socket.set_read_timeout(Some(remaining))?;

            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                    // ICMP port unreachable from an earlier send (Windows)
                    tracing::debug!("Ignoring connection reset while waiting for {}", id);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match Envelope::decode_verified(&buf[..len]) {
                Ok(envelope) if envelope.id == *id => return Ok(Some(envelope.payload)),
                Ok(envelope) => {
                    tracing::debug!("Ignoring reply for {} from {}", envelope.id, from);
                }
                Err(e) => {
                    tracing::debug!("Ignoring datagram from {}: {}", from, e);
                }
            }
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

// =============================================================================
// Key-Value Client
// =============================================================================

/// Typed key-value client bound to one server
pub struct KvClient {
    transport: ClientTransport,
    server: SocketAddr,
}

impl KvClient {
    /// Create a client for the server at `server`
    pub fn connect(server: impl ToSocketAddrs, config: ClientConfig) -> Result<Self> {
        let server = server
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| KvError::Config("server address resolved to nothing".to_string()))?;
        Ok(Self {
            transport: ClientTransport::bind(config)?,
            server,
        })
    }

    /// Send a command and decode the response
    pub fn request(&self, command: &Command) -> Result<Response> {
        let payload = encode_command(command)?;
        let reply = self.transport.send(&payload, self.server)?;
        decode_response(&reply)
    }

    pub fn put(&self, key: &[u8], value: &[u8], version: i32) -> Result<Response> {
        self.request(&Command::Put {
            key: key.to_vec(),
            value: value.to_vec(),
            version,
        })
    }

    pub fn get(&self, key: &[u8]) -> Result<Response> {
        self.request(&Command::Get { key: key.to_vec() })
    }

    pub fn remove(&self, key: &[u8]) -> Result<Response> {
        self.request(&Command::Remove { key: key.to_vec() })
    }

    pub fn wipeout(&self) -> Result<Response> {
        self.request(&Command::Wipeout)
    }

    pub fn is_alive(&self) -> Result<Response> {
        self.request(&Command::IsAlive)
    }

    pub fn get_pid(&self) -> Result<Response> {
        self.request(&Command::GetPid)
    }

    pub fn get_membership_count(&self) -> Result<Response> {
        self.request(&Command::GetMembershipCount)
    }

    /// Ask the server to exit
    ///
    /// The server never answers a shutdown, so running out of retries is
    /// the expected result.
    pub fn shutdown(&self) -> Result<()> {
        match self.request(&Command::Shutdown) {
            Ok(_) | Err(KvError::Timeout { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server
    }
}
