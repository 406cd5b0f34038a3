//! Gateway server
//!
//! ```text
//!   start() ──► event loop thread (tokio current_thread)
//!                 accept ──► admission ──► connection task ──► ACK/NAK
//!                                                │
//!                                                ▼
//!                                          MessageQueue
//!                                                │
//!               worker pool (std threads) ◄──────┘ ──► Dispatcher
//! ```
//!
//! `start()` blocks the calling thread until `stop()` is called from another
//! thread. A stopped server can be started again on the same address.

mod connection;
mod dispatch;
mod stats;
mod worker;

pub use connection::{ConnectionId, ConnectionInfo};
pub use dispatch::{Dispatcher, MessageHandler};
pub use stats::Statistics;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::transport::MessageQueue;
use connection::{ConnectionContext, ConnectionGuard, ConnectionRegistry};
use fixgate_core::Message;
use fixgate_order_manager::OrderStore;
use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};
use stats::StatsCollector;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Running,
    Stopping,
    Stopped,
}

struct Lifecycle {
    state: ServerState,
    shutdown: Option<watch::Sender<bool>>,
    workers: Vec<JoinHandle<()>>,
    loop_active: bool,
}

pub struct GatewayServer {
    config: ServerConfig,
    local_addr: SocketAddr,
    listener: Mutex<Option<StdTcpListener>>,
    dispatcher: Arc<Dispatcher>,
    queue: Arc<MessageQueue<Message>>,
    stats: Arc<StatsCollector>,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
    lifecycle: Mutex<Lifecycle>,
    loop_exited: Condvar,
}

impl GatewayServer {
    /// Bind the listening socket; FIX orders are applied to `store`
    pub fn bind(config: ServerConfig, store: Arc<OrderStore>) -> Result<Self, ServerError> {
        Self::with_dispatcher(config, Dispatcher::new(store))
    }

    /// Bind the listening socket with a custom handler table
    pub fn with_dispatcher(
        config: ServerConfig,
        dispatcher: Dispatcher,
    ) -> Result<Self, ServerError> {
        let listener = bind_listener(SocketAddr::from(([0, 0, 0, 0], config.port)))?;
        let local_addr = listener.local_addr()?;
        info!("Server bound to {}", local_addr);

        Ok(Self {
            config,
            local_addr,
            listener: Mutex::new(Some(listener)),
            dispatcher: Arc::new(dispatcher),
            queue: Arc::new(MessageQueue::new()),
            stats: Arc::new(StatsCollector::new()),
            registry: Arc::new(ConnectionRegistry::new()),
            running: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::new(Lifecycle {
                state: ServerState::Created,
                shutdown: None,
                workers: Vec::new(),
                loop_active: false,
            }),
            loop_exited: Condvar::new(),
        })
    }

    /// Run the server on the calling thread until [`stop`](Self::stop).
    ///
    /// Calling this while the server is already running logs a warning and
    /// returns immediately.
    pub fn start(&self) -> Result<(), ServerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let (listener, shutdown) = {
            let mut lifecycle = self.lifecycle.lock();
            if matches!(lifecycle.state, ServerState::Running | ServerState::Stopping) {
                warn!("Server is already running");
                return Ok(());
            }

            let listener = match self.listener.lock().take() {
                Some(listener) => listener,
                None => bind_listener(self.local_addr)?,
            };

            self.queue.reopen();
            self.running.store(true, Ordering::Release);
            lifecycle.workers = match worker::spawn_pool(
                self.config.thread_pool_size,
                Arc::clone(&self.queue),
                Arc::clone(&self.dispatcher),
                Arc::clone(&self.stats),
                Arc::clone(&self.running),
                self.config.queue_pop_timeout(),
            ) {
                Ok(workers) => workers,
                Err(e) => {
                    self.running.store(false, Ordering::Release);
                    self.queue.stop();
                    *self.listener.lock() = Some(listener);
                    return Err(e.into());
                }
            };

            let (tx, rx) = watch::channel(false);
            lifecycle.shutdown = Some(tx);
            lifecycle.loop_active = true;
            lifecycle.state = ServerState::Running;
            (listener, rx)
        };

        info!(
            "Server started on port {} with {} worker threads",
            self.local_addr.port(),
            self.config.thread_pool_size
        );

        let result = runtime.block_on(self.event_loop(listener, shutdown));
        // Dropping the runtime cancels any connection task still alive
        drop(runtime);

        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.loop_active = false;
            self.loop_exited.notify_all();
        }

        if let Err(e) = &result {
            error!("Event loop failed: {}", e);
            self.stop();
        }
        result
    }

    /// Stop accepting, halt the event loop and join the worker pool.
    ///
    /// A no-op unless the server is running.
    pub fn stop(&self) {
        let (shutdown, workers) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != ServerState::Running {
                return;
            }
            lifecycle.state = ServerState::Stopping;
            (
                lifecycle.shutdown.take(),
                std::mem::take(&mut lifecycle.workers),
            )
        };

        info!("Stopping server...");
        if let Some(shutdown) = shutdown {
            let _ = shutdown.send(true);
        }
        self.running.store(false, Ordering::Release);
        self.queue.stop();

        for handle in workers {
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }

        let mut lifecycle = self.lifecycle.lock();
        while lifecycle.loop_active {
            self.loop_exited.wait(&mut lifecycle);
        }
        lifecycle.state = ServerState::Stopped;
        info!("Server stopped");
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    /// Address the server listens on, with the OS-assigned port when bound to 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.snapshot()
    }

    /// Live connections, oldest first
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.registry.connections()
    }

    /// Messages accepted from the network but not yet taken by a worker
    pub fn pending_messages(&self) -> usize {
        self.queue.len()
    }

    async fn event_loop(
        &self,
        listener: StdTcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ServerError> {
        listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(listener)?;

        let ctx = ConnectionContext {
            queue: Arc::clone(&self.queue),
            stats: Arc::clone(&self.stats),
            registry: Arc::clone(&self.registry),
            idle_timeout: self.config.client_timeout(),
        };

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => break,
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => self.admit(socket, peer, &ctx, shutdown.clone()),
                    Err(e) => {
                        error!("Accept error: {}", e);
                        self.stats.record_error();
                    }
                },
            }
        }

        debug!("Event loop halted, closing listener");
        Ok(())
    }

    fn admit(
        &self,
        socket: TcpStream,
        peer: SocketAddr,
        ctx: &ConnectionContext,
        shutdown: watch::Receiver<bool>,
    ) {
        let Some(active) = self.stats.try_admit(self.config.max_connections) else {
            warn!(
                "Max connections reached ({}), rejecting connection from {}",
                self.config.max_connections, peer
            );
            drop(socket);
            return;
        };

        let guard =
            ConnectionGuard::register(peer, Arc::clone(&ctx.registry), Arc::clone(&ctx.stats));
        info!(
            "Accepted connection {} from {} ({} active)",
            guard.id(),
            peer,
            active
        );
        tokio::spawn(connection::serve(socket, guard, ctx.clone(), shutdown));
    }
}

fn bind_listener(addr: SocketAddr) -> Result<StdTcpListener, ServerError> {
    StdTcpListener::bind(addr).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })
}
