//! Order Manager errors

use fixgate_core::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Order already exists: {0}")]
    AlreadyExists(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Message has no order id (tag 11)")]
    MissingOrderId,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, Error>;
