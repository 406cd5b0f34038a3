//! Wire codec for the gateway protocol
//!
//! Messages are `tag=value` pairs separated by `|`, e.g.
//! `35=D|49=SENDER|56=TARGET|11=O1|55=AAPL|54=1|44=150.50|38=100|40=2|`.
//! On TCP each message is terminated by a single `'\n'`.
//!
//! Decoding is strict: a non-empty token without `=` fails the whole message.
//! Encoding is deterministic so encoded output can be compared byte-for-byte.

mod error;
mod fields;
pub mod tags;

pub use error::ProtocolError;
pub use fields::{FieldSet, decode, encode};

/// Separator between fields
pub const FIELD_DELIMITER: char = '|';

/// Separator between a tag and its value
pub const TAG_VALUE_SEPARATOR: char = '=';

/// Terminator of one message on the stream
pub const MESSAGE_TERMINATOR: u8 = b'\n';
