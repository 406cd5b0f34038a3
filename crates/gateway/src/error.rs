//! Error types for the gateway crate

use fixgate_core::ProtocolError;
use std::io;
use thiserror::Error;

/// Server lifecycle errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("Failed to build event loop runtime: {0}")]
    Runtime(io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Why a single inbound message was answered with a NAK
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Message is not valid UTF-8")]
    InvalidUtf8,

    #[error("Server is shutting down")]
    QueueStopped,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Worker-side dispatch failures
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Order processing failed: {0}")]
    Order(#[from] fixgate_order_manager::Error),
}

/// Client connectivity and request errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not connected")]
    NotConnected,

    #[error("Failed to resolve {host}: {source}")]
    Resolve { host: String, source: io::Error },

    #[error("Connection to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("Write error: {0}")]
    Write(io::Error),

    #[error("Read error: {0}")]
    Read(io::Error),

    #[error("Connection closed by server")]
    Closed,

    #[error("Server rejected message: {0}")]
    Rejected(String),

    #[error("Failed to reconnect after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    #[error("Failed to open file {path}: {source}")]
    File { path: String, source: io::Error },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
