//! Line-oriented responses sent back to gateway clients

pub mod response;

pub use response::{Acknowledgment, OrderResponse};
