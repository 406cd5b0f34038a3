//! Per-connection state and the read/respond loop
//!
//! Connections live in an arena keyed by a monotonically increasing
//! [`ConnectionId`]. The task serving a connection owns a [`ConnectionGuard`];
//! the slot is freed and the active count released only when that task ends,
//! so nothing can observe a slot after its socket is gone.

use super::stats::StatsCollector;
use crate::error::ProcessingError;
use crate::messages::{Acknowledgment, OrderResponse};
use crate::transport::MessageQueue;
use dashmap::DashMap;
use fixgate_core::wire::MESSAGE_TERMINATOR;
use fixgate_core::{Message, decode};
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;

pub type ConnectionId = u64;

/// Monitoring view of one live connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub messages: u64,
    pub connected_for: Duration,
}

#[derive(Debug)]
struct Slot {
    peer: SocketAddr,
    opened_at: Instant,
    messages: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    next_id: AtomicU64,
    slots: DashMap<ConnectionId, Slot>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connections(&self) -> Vec<ConnectionInfo> {
        let mut connections: Vec<_> = self
            .slots
            .iter()
            .map(|entry| ConnectionInfo {
                id: *entry.key(),
                peer: entry.peer,
                messages: entry.messages,
                connected_for: entry.opened_at.elapsed(),
            })
            .collect();
        connections.sort_by_key(|c| c.id);
        connections
    }

    fn note_message(&self, id: ConnectionId) {
        if let Some(mut slot) = self.slots.get_mut(&id) {
            slot.messages += 1;
        }
    }
}

/// Owns one arena slot and one admitted connection
pub(crate) struct ConnectionGuard {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<StatsCollector>,
}

impl ConnectionGuard {
    /// Register an admitted connection. The caller must already hold an
    /// admission from [`StatsCollector::try_admit`].
    pub(crate) fn register(
        peer: SocketAddr,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        let id = registry.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        registry.slots.insert(
            id,
            Slot {
                peer,
                opened_at: Instant::now(),
                messages: 0,
            },
        );
        Self {
            id,
            registry,
            stats,
        }
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.slots.remove(&self.id);
        self.stats.release();
    }
}

/// What every connection task needs from the server
#[derive(Clone)]
pub(crate) struct ConnectionContext {
    pub(crate) queue: Arc<MessageQueue<Message>>,
    pub(crate) stats: Arc<StatsCollector>,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) idle_timeout: Duration,
}

impl ConnectionContext {
    /// Turn one raw request (terminator already stripped) into a response line.
    ///
    /// The message is queued for the workers before it is validated, so an
    /// order can reach the store even when the response is a NAK.
    pub(crate) fn process_message(&self, raw: &[u8]) -> OrderResponse {
        let started = Instant::now();
        match self.try_process(raw, started) {
            Ok(ack) => {
                self.stats.record_processed(started.elapsed());
                OrderResponse::Ack(ack)
            }
            Err(e) => {
                error!("Message processing error: {}", e);
                self.stats.record_error();
                OrderResponse::nak(e)
            }
        }
    }

    fn try_process(&self, raw: &[u8], started: Instant) -> Result<Acknowledgment, ProcessingError> {
        let payload = std::str::from_utf8(raw).map_err(|_| ProcessingError::InvalidUtf8)?;

        self.queue
            .push(Message::fix(payload))
            .map_err(|_| ProcessingError::QueueStopped)?;

        let fields = decode(payload)?;
        Ok(Acknowledgment::from_fields(&fields, started.elapsed())?)
    }
}

/// Serve one connection until the peer leaves, it idles out, or shutdown
pub(crate) async fn serve(
    socket: TcpStream,
    guard: ConnectionGuard,
    ctx: ConnectionContext,
    mut shutdown: watch::Receiver<bool>,
) {
    let id = guard.id();
    if let Err(e) = socket.set_nodelay(true) {
        debug!("Connection {}: could not disable Nagle: {}", id, e);
    }

    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(256);

    loop {
        line.clear();

        let read = tokio::select! {
            _ = shutdown.changed() => {
                debug!("Connection {}: closing for shutdown", id);
                break;
            }
            read = tokio::time::timeout(
                ctx.idle_timeout,
                reader.read_until(MESSAGE_TERMINATOR, &mut line),
            ) => read,
        };

        match read {
            Err(_) => {
                info!("Connection {} idle for {:?}, closing", id, ctx.idle_timeout);
                break;
            }
            Ok(Err(e)) => {
                debug!("Connection {}: read error: {}", id, e);
                break;
            }
            Ok(Ok(0)) => {
                debug!("Connection {}: closed by peer", id);
                break;
            }
            Ok(Ok(_)) if line.last() != Some(&MESSAGE_TERMINATOR) => {
                debug!("Connection {}: peer closed mid-message, {} bytes dropped", id, line.len());
                break;
            }
            Ok(Ok(_)) => {}
        }

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        ctx.registry.note_message(id);
        let response = ctx.process_message(&line);

        let mut out = response.to_string().into_bytes();
        out.push(MESSAGE_TERMINATOR);
        if let Err(e) = writer.write_all(&out).await {
            error!("Connection {}: failed to send response: {}", id, e);
        }
    }

    drop(guard);
}
