//! FIX tags used by the gateway.
//!
//! Using constants rather than an enum keeps lookups on the decoded
//! [`FieldSet`](super::FieldSet) allocation free.

pub const MSG_TYPE: &str = "35";
pub const SENDER_COMP_ID: &str = "49";
pub const TARGET_COMP_ID: &str = "56";
/// Client order ID, unique per order while it is active
pub const CL_ORD_ID: &str = "11";
pub const SYMBOL: &str = "55";
/// `1` = buy, `2` = sell
pub const SIDE: &str = "54";
pub const PRICE: &str = "44";
pub const ORDER_QTY: &str = "38";
/// `2` = limit
pub const ORD_TYPE: &str = "40";

/// Header tags emitted first, in this order, by [`encode`](super::encode)
pub const HEADER_ORDER: [&str; 3] = [MSG_TYPE, SENDER_COMP_ID, TARGET_COMP_ID];

/// Message type values
pub mod msg_types {
    pub const NEW_ORDER_SINGLE: &str = "D";
}

/// Order type values
pub mod ord_types {
    pub const LIMIT: &str = "2";
}
