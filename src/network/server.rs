//! UDP Server
//!
//! Runs worker threads that receive, dispatch, and reply.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use crossbeam::channel;

use crate::admission::{AdmissionController, CapacityOracle, SystemOracle};
use crate::config::Config;
use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::{KvError, Result};
use crate::protocol::{encode_response, ErrCode, Response};
use super::transport::{is_timeout, InboundRequest, ServerTransport};

/// Why the server stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// Stopped through a [`ServerHandle`]
    Stopped,

    /// A client sent the shutdown command; the host process should exit
    Shutdown,
}

/// Remote control for a running server
#[derive(Clone)]
pub struct ServerHandle {
    stop: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Ask every worker to stop after its current poll interval
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// UDP server for udpkv
pub struct Server {
    config: Config,
    transport: ServerTransport,
    dispatcher: Dispatcher,
    stop: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address, measuring capacity with a [`SystemOracle`]
    /// limited to `config.memory_limit`
    pub fn bind(config: Config) -> Result<Self> {
        let oracle = Arc::new(SystemOracle::new(config.memory_limit));
        Self::with_oracle(config, oracle)
    }

    /// Bind the listen address with a caller-supplied capacity oracle
    ///
    /// `config.memory_limit` is not consulted; the oracle decides.
    pub fn with_oracle(config: Config, oracle: Arc<dyn CapacityOracle>) -> Result<Self> {
        config.validate()?;

        let transport = ServerTransport::bind(
            config.listen_addr.as_str(),
            config.dedup_max_entries,
            config.dedup_ttl(),
        )?;
        transport.set_read_timeout(Some(config.poll_interval()))?;

        let admission = AdmissionController::new(oracle, config.admission);
        let dispatcher = Dispatcher::new(&config, admission);

        Ok(Self {
            config,
            transport,
            dispatcher,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            stop: Arc::clone(&self.stop),
            local_addr: self.local_addr(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn transport(&self) -> &ServerTransport {
        &self.transport
    }

    /// Serve until stopped or told to shut down (blocking)
    pub fn run(&self) -> Result<ServeExit> {
        tracing::info!(
            "Serving on {} with {} worker(s)",
            self.local_addr(),
            self.config.workers
        );

        let (exit_tx, exit_rx) = channel::unbounded();

        thread::scope(|scope| -> Result<()> {
            for worker in 0..self.config.workers {
                let exit_tx = exit_tx.clone();
                thread::Builder::new()
                    .name(format!("udpkv-worker-{}", worker))
                    .spawn_scoped(scope, move || {
                        let exit = self.worker_loop();
                        let _ = exit_tx.send(exit);
                    })
                    .map_err(|e| {
                        self.stop.store(true, Ordering::SeqCst);
                        KvError::Io(e)
                    })?;
            }
            Ok(())
        })?;

        drop(exit_tx);
        let exit = if exit_rx.iter().any(|exit| exit == ServeExit::Shutdown) {
            ServeExit::Shutdown
        } else {
            ServeExit::Stopped
        };

        tracing::info!("Server on {} stopped ({:?})", self.local_addr(), exit);
        Ok(exit)
    }

    /// Receive and handle requests until the stop flag is raised
    fn worker_loop(&self) -> ServeExit {
        while !self.stop.load(Ordering::SeqCst) {
            let request = match self.transport.receive() {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(KvError::Io(ref e)) if is_timeout(e) => {
                    let purged = self.transport.purge_expired();
                    if purged > 0 {
                        tracing::trace!("Purged {} expired dedup entries", purged);
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error receiving datagram: {}", e);
                    continue;
                }
            };

            if self.process(&request) == Some(ServeExit::Shutdown) {
                self.stop.store(true, Ordering::SeqCst);
                return ServeExit::Shutdown;
            }
        }
        ServeExit::Stopped
    }

    /// Handle one accepted request
    ///
    /// Returns `Some(Shutdown)` when the request was a shutdown command.
    pub fn process(&self, request: &InboundRequest) -> Option<ServeExit> {
        if !self.dispatcher.admission().has_operating_headroom() {
            tracing::warn!("Overloaded; rejecting request {}", request.id);
            self.send(request, &Response::status(ErrCode::Overload), false);
            return None;
        }

        match self.dispatcher.handle_payload(&request.payload) {
            Outcome::Reply(response) => {
                self.send(request, &response, true);
                None
            }
            Outcome::Shutdown => Some(ServeExit::Shutdown),
        }
    }

    /// Encode and send a response, caching it when `cache` is set
    ///
    /// A response too large for a datagram is replaced by `GeneralFail`.
    fn send(&self, request: &InboundRequest, response: &Response, cache: bool) {
        let sent = encode_response(response).and_then(|bytes| {
            let payload = Bytes::from(bytes);
            if cache {
                self.transport.reply(request, payload)
            } else {
                self.transport.reject(request, payload)
            }
        });

        match sent {
            Ok(()) => {}
            Err(e) if e.is_protocol() && response.err_code != ErrCode::GeneralFail => {
                tracing::warn!("Could not frame response for {}: {}", request.id, e);
                self.send(request, &Response::status(ErrCode::GeneralFail), cache);
            }
            Err(e) => {
                tracing::warn!("Error replying to {}: {}", request.requester, e);
            }
        }
    }
}
