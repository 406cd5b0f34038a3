//! Fixgate Core
//!
//! Shared kernel for the fixgate order gateway.
//! This crate contains no async and no I/O, and is 100% unit testable.
//!
//! - **Entities**: the [`Message`] envelope carried between the network layer
//!   and the worker pool, and the order [`Side`]
//! - **Wire**: the `|`-delimited `tag=value` codec spoken over TCP

pub mod entities;
pub mod wire;

// Re-export commonly used types at crate root
pub use entities::{Message, MessageKind, Side};
pub use wire::{FieldSet, ProtocolError, decode, encode, tags};
