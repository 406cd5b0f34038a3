//! Fixgate Gateway
//!
//! Network layer of the fixgate order gateway. Provides:
//! - Inter-stage queue between the I/O path and the worker pool
//! - Gateway server: event loop, connection arena, worker pool
//! - Gateway client: one outbound connection with retry/backoff
//!
//! ## Architecture
//!
//! ```text
//!  GatewayClient ──TCP──► event loop ──► decode ──► ACK/NAK ──TCP──► GatewayClient
//!                             │
//!                             │ Message (FIX)
//!                        ┌────▼─────┐
//!                        │  Queue   │
//!                        └────┬─────┘
//!                  ┌──────────┼──────────┐
//!               worker     worker     worker  ──► Dispatcher ──► OrderStore
//! ```
//!
//! An ACK only means the message was syntactically accepted and queued; the
//! order becomes visible in the store once a worker has applied it.

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use client::{FileSendSummary, GatewayClient};
pub use config::{ClientConfig, ServerConfig};
pub use error::{ClientError, ConfigError, HandlerError, ProcessingError, ServerError};
pub use messages::OrderResponse;
pub use server::{
    ConnectionId, ConnectionInfo, Dispatcher, GatewayServer, MessageHandler, ServerState,
    Statistics,
};
pub use transport::{MessageQueue, Sequenced};
