//! ACK / NAK response lines
//!
//! ```text
//! ACK|OrderID=O1|Symbol=AAPL|Side=BUY|Quantity=100|Price=150.50|Status=ACCEPTED|ProcessingTime=42us
//! NAK|Error=Missing required tag 55
//! ```
//!
//! Quantity and price are echoed verbatim as received.

use fixgate_core::{FieldSet, ProtocolError, Side, tags};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const ACK_PREFIX: &str = "ACK";
pub const NAK_PREFIX: &str = "NAK";

/// Tags an order must carry before it is acknowledged, checked in this order
pub const REQUIRED_ORDER_TAGS: [&str; 5] = [
    tags::CL_ORD_ID,
    tags::SYMBOL,
    tags::SIDE,
    tags::ORDER_QTY,
    tags::PRICE,
];

/// Echo of an accepted order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: String,
    pub price: String,
    pub processing_time: Duration,
}

impl Acknowledgment {
    /// Build an acknowledgment from a decoded order
    pub fn from_fields(
        fields: &FieldSet,
        processing_time: Duration,
    ) -> Result<Self, ProtocolError> {
        for tag in REQUIRED_ORDER_TAGS {
            fields.require(tag)?;
        }

        Ok(Self {
            order_id: fields.require(tags::CL_ORD_ID)?.to_string(),
            symbol: fields.require(tags::SYMBOL)?.to_string(),
            side: Side::from_fix(fields.require(tags::SIDE)?),
            quantity: fields.require(tags::ORDER_QTY)?.to_string(),
            price: fields.require(tags::PRICE)?.to_string(),
            processing_time,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderResponse {
    Ack(Acknowledgment),
    Nak { error: String },
}

impl OrderResponse {
    pub fn nak(error: impl fmt::Display) -> Self {
        Self::Nak {
            error: error.to_string(),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack(_))
    }

    /// Whether a raw response line is an acknowledgment
    pub fn line_is_ack(line: &str) -> bool {
        line.starts_with(ACK_PREFIX)
    }

    /// Parse a response line produced by the server.
    ///
    /// Returns `None` for anything that is neither a well-formed ACK nor a NAK.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (head, rest) = line.split_once('|').unwrap_or((line, ""));

        match head {
            NAK_PREFIX => {
                let error = rest.strip_prefix("Error=").unwrap_or(rest);
                Some(Self::Nak {
                    error: error.to_string(),
                })
            }
            ACK_PREFIX => {
                let fields: HashMap<&str, &str> = rest
                    .split('|')
                    .filter_map(|token| token.split_once('='))
                    .collect();

                let processing_time = fields
                    .get("ProcessingTime")
                    .and_then(|t| t.strip_suffix("us"))
                    .and_then(|t| t.parse::<u64>().ok())
                    .map(Duration::from_micros)
                    .unwrap_or_default();

                Some(Self::Ack(Acknowledgment {
                    order_id: fields.get("OrderID")?.to_string(),
                    symbol: fields.get("Symbol")?.to_string(),
                    side: Side::parse_name(fields.get("Side")?)?,
                    quantity: fields.get("Quantity")?.to_string(),
                    price: fields.get("Price")?.to_string(),
                    processing_time,
                }))
            }
            _ => None,
        }
    }
}

impl fmt::Display for OrderResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack(ack) => write!(
                f,
                "{ACK_PREFIX}|OrderID={}|Symbol={}|Side={}|Quantity={}|Price={}|Status=ACCEPTED|ProcessingTime={}us",
                ack.order_id,
                ack.symbol,
                ack.side.as_str(),
                ack.quantity,
                ack.price,
                ack.processing_time.as_micros()
            ),
            Self::Nak { error } => write!(f, "{NAK_PREFIX}|Error={error}"),
        }
    }
}
