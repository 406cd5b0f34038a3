//! Blocking gateway client
//!
//! One outbound TCP connection, reused between requests. Every request is
//! written as one line and the caller waits for the matching response line.
//! The connection is checked out for the exchange, so concurrent callers
//! never interleave frames on one socket; a caller that finds it checked out
//! opens its own.
//!
//! ```text
//!  send(msg) ──► [reconnect with backoff if needed] ──► write "payload\n"
//!                                                    ◄── read "ACK|..." / "NAK|..."
//! ```

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::messages::OrderResponse;
use fixgate_core::wire::MESSAGE_TERMINATOR;
use fixgate_core::{Message, MessageKind};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::fs::File;
use std::future::Future;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Pause between consecutive lines in [`GatewayClient::send_file`]
pub const FILE_SEND_PACING: Duration = Duration::from_millis(10);

/// Outcome of a [`GatewayClient::send_file`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSendSummary {
    /// Lines acknowledged by the server
    pub sent: usize,
    /// Lines that were rejected or could not be delivered
    pub failed: usize,
    /// Whitespace-only lines that were skipped
    pub blank: usize,
}

impl FileSendSummary {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

struct Connection {
    reader: BufReader<TcpStream>,
}

impl Connection {
    /// Whether the server still has this socket open.
    ///
    /// A server that idled the connection out has sent FIN, which shows up as
    /// a zero-length nonblocking peek.
    fn is_open(&self) -> bool {
        if !self.reader.buffer().is_empty() {
            return true;
        }

        let stream = self.reader.get_ref();
        if let Err(e) = stream.set_nonblocking(true) {
            debug!("Cannot check socket state: {}", e);
            return false;
        }
        let mut byte = [0u8; 1];
        let open = match stream.peek(&mut byte) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => e.kind() == io::ErrorKind::WouldBlock,
        };
        stream.set_nonblocking(false).is_ok() && open
    }

    fn round_trip(&mut self, payload: &str) -> Result<String, ClientError> {
        let stream = self.reader.get_mut();
        let mut frame = Vec::with_capacity(payload.len() + 1);
        frame.extend_from_slice(payload.as_bytes());
        frame.push(MESSAGE_TERMINATOR);
        stream.write_all(&frame).map_err(ClientError::Write)?;
        stream.flush().map_err(ClientError::Write)?;

        let mut response = String::new();
        let read = self.reader.read_line(&mut response).map_err(ClientError::Read)?;
        if read == 0 || !response.ends_with('\n') {
            return Err(ClientError::Closed);
        }

        let trimmed = response.trim_end_matches(['\r', '\n']).len();
        response.truncate(trimmed);
        Ok(response)
    }

    fn close(self) {
        if let Err(e) = self.reader.get_ref().shutdown(Shutdown::Both) {
            debug!("Socket shutdown: {}", e);
        }
    }
}

/// The idle connection between requests.
///
/// `generation` changes on every explicit disconnect, so a connection checked
/// out before the disconnect is closed instead of being put back.
#[derive(Default)]
struct Slot {
    idle: Option<Connection>,
    generation: u64,
}

pub struct GatewayClient {
    config: ClientConfig,
    // Only guards the hand-off; never held across socket I/O or backoff
    slot: Mutex<Slot>,
    connected: AtomicBool,
    attempts: AtomicUsize,
    last_error: Mutex<String>,
}

impl GatewayClient {
    /// Create a disconnected client. `SERVER_HOST`, when set, replaces the host.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: config.with_env_overrides(),
            slot: Mutex::new(Slot::default()),
            connected: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            last_error: Mutex::new(String::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Make one connection attempt. Returns `true` if connected afterwards.
    pub fn connect(&self) -> bool {
        if self.is_connected() {
            debug!("Already connected");
            return true;
        }
        match self.attempt() {
            Ok(connection) => {
                self.install(connection);
                true
            }
            Err(_) => false,
        }
    }

    /// Close the connection if there is one
    pub fn disconnect(&self) {
        let idle = {
            let mut slot = self.slot.lock();
            slot.generation += 1;
            slot.idle.take()
        };
        let was_connected = self.connected.swap(false, Ordering::AcqRel);

        if let Some(open) = idle {
            open.close();
        }
        if was_connected {
            info!("Disconnected from {}:{}", self.config.host, self.config.port);
        } else {
            debug!("Already disconnected");
        }
    }

    /// Retry connecting up to `retry_attempts` times with exponential backoff
    pub fn reconnect(&self) -> Result<(), ClientError> {
        self.disconnect();
        let connection = self.establish()?;
        self.install(connection);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Total connection attempts made over the client's lifetime
    pub fn connection_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Most recent failure, empty if nothing has failed yet
    pub fn last_error(&self) -> String {
        self.last_error.lock().clone()
    }

    /// Send a message and return the server's ACK line.
    ///
    /// Connects first (with retries) if needed, including when the server has
    /// closed the idle connection since the last request. A NAK is returned as
    /// [`ClientError::Rejected`]. Transport failures drop the connection.
    pub fn request(&self, message: &Message) -> Result<String, ClientError> {
        let (mut connection, generation) = self.checkout()?;

        match connection.round_trip(message.payload()) {
            Ok(line) => {
                self.checkin(connection, generation);
                if OrderResponse::line_is_ack(&line) {
                    info!("Received ACK: {}", line);
                    Ok(line)
                } else {
                    error!("Server rejected message: {}", line);
                    let err = ClientError::Rejected(line);
                    self.record_error(&err);
                    Err(err)
                }
            }
            Err(e) => {
                error!("Request failed: {}", e);
                connection.close();
                self.connected.store(false, Ordering::Release);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Send a message; `true` only if it was acknowledged
    pub fn send(&self, message: &Message) -> bool {
        debug!("Sending {} message: {}", message.kind(), message.payload());
        self.request(message).is_ok()
    }

    /// Send on the blocking pool of the current tokio runtime.
    ///
    /// The send starts immediately; awaiting the returned future is optional.
    /// Must be called from within a tokio runtime.
    pub fn send_async(
        self: &Arc<Self>,
        message: Message,
    ) -> impl Future<Output = bool> + Send + 'static {
        let client = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || client.send(&message));
        async move {
            match task.await {
                Ok(acked) => acked,
                Err(e) => {
                    error!("Async send task failed: {}", e);
                    false
                }
            }
        }
    }

    /// Send every non-blank line of a file as a message of `kind`
    pub fn send_file(
        &self,
        path: impl AsRef<Path>,
        kind: MessageKind,
    ) -> Result<FileSendSummary, ClientError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            let err = ClientError::File {
                path: path.display().to_string(),
                source,
            };
            error!("{}", err);
            self.record_error(&err);
            err
        })?;

        let mut summary = FileSendSummary::default();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| {
                let err = ClientError::File {
                    path: path.display().to_string(),
                    source,
                };
                self.record_error(&err);
                err
            })?;
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() {
                summary.blank += 1;
                continue;
            }

            if self.send(&Message::new(kind, line)) {
                summary.sent += 1;
            } else {
                summary.failed += 1;
                warn!("Failed to send line {} of {}", index + 1, path.display());
            }
            thread::sleep(FILE_SEND_PACING);
        }

        info!(
            "File sending completed. Successfully sent {} of {} messages",
            summary.sent,
            summary.attempted()
        );
        Ok(summary)
    }

    /// Take the idle connection, or open a fresh one if there is none or the
    /// server has closed it
    fn checkout(&self) -> Result<(Connection, u64), ClientError> {
        let (idle, generation) = {
            let mut slot = self.slot.lock();
            (slot.idle.take(), slot.generation)
        };
        if let Some(connection) = idle {
            if connection.is_open() {
                return Ok((connection, generation));
            }
            info!("Server closed the idle connection, reconnecting");
            connection.close();
            self.connected.store(false, Ordering::Release);
        }

        let connection = self.establish()?;
        self.connected.store(true, Ordering::Release);
        let generation = self.slot.lock().generation;
        Ok((connection, generation))
    }

    /// Return a connection after a successful exchange
    fn checkin(&self, connection: Connection, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.generation == generation && slot.idle.is_none() {
            slot.idle = Some(connection);
        } else {
            drop(slot);
            connection.close();
        }
    }

    fn install(&self, connection: Connection) {
        let generation = self.slot.lock().generation;
        self.checkin(connection, generation);
        self.connected.store(true, Ordering::Release);
    }

    fn establish(&self) -> Result<Connection, ClientError> {
        self.establish_with(thread::sleep)
    }

    /// Up to `retry_attempts` connection attempts. `pause` receives each
    /// backoff delay; there is none after the final attempt.
    fn establish_with(&self, mut pause: impl FnMut(Duration)) -> Result<Connection, ClientError> {
        let attempts = self.config.retry_attempts;
        info!("Attempting to reconnect ({} attempts)", attempts);

        for attempt in 0..attempts {
            debug!("Connection attempt {} of {}", attempt + 1, attempts);
            if let Ok(connection) = self.attempt() {
                return Ok(connection);
            }
            if attempt + 1 < attempts {
                pause(self.config.backoff_delay(attempt));
            }
        }

        let err = ClientError::RetriesExhausted {
            attempts,
            last_error: self.last_error(),
        };
        error!("{}", err);
        self.record_error(&err);
        Err(err)
    }

    /// One counted connection attempt
    fn attempt(&self) -> Result<Connection, ClientError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        info!("Attempting to connect to {}:{}", self.config.host, self.config.port);

        match self.open() {
            Ok(connection) => {
                info!("Connected to {}:{}", self.config.host, self.config.port);
                Ok(connection)
            }
            Err(e) => {
                warn!("{}", e);
                self.record_error(&e);
                Err(e)
            }
        }
    }

    fn open(&self) -> Result<Connection, ClientError> {
        let host = self.config.host.as_str();
        let addr_label = format!("{}:{}", host, self.config.port);
        let addrs = (host, self.config.port)
            .to_socket_addrs()
            .map_err(|source| ClientError::Resolve {
                host: host.to_string(),
                source,
            })?;

        let timeout = self.config.timeout();
        let mut last_failure = None;
        for addr in addrs {
            let attempt = if timeout.is_zero() {
                TcpStream::connect(addr)
            } else {
                TcpStream::connect_timeout(&addr, timeout)
            };
            match attempt {
                Ok(stream) => {
                    configure(&stream, timeout).map_err(|source| ClientError::Connect {
                        addr: addr_label.clone(),
                        source,
                    })?;
                    return Ok(Connection {
                        reader: BufReader::new(stream),
                    });
                }
                Err(e) => last_failure = Some(e),
            }
        }

        Err(ClientError::Connect {
            addr: addr_label,
            source: last_failure.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")
            }),
        })
    }

    fn record_error(&self, err: &ClientError) {
        *self.last_error.lock() = err.to_string();
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        if let Some(open) = self.slot.get_mut().idle.take() {
            open.close();
        }
    }
}

fn configure(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    let deadline = (!timeout.is_zero()).then_some(timeout);
    stream.set_read_timeout(deadline)?;
    stream.set_write_timeout(deadline)?;
    stream.set_nodelay(true)
}
