//! Command-line helpers for the FIX client

use crate::error::{Error, Result};
use fixgate_core::{FieldSet, Side, encode, tags};
use fixgate_gateway::OrderResponse;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

pub const USAGE: &str = r#"Usage:
  1. Single order:    fix-client -o "35=D|49=SENDER|56=TARGET|11=ORDER123|55=AAPL|54=1|44=150.50|38=100|40=2|"
  2. File input:      fix-client -f orders.txt
  3. Interactive:     fix-client -i

FIX Message Format:
  35=D         : New Order Single
  49=SENDER    : SenderCompID
  56=TARGET    : TargetCompID
  11=ORDER123  : ClOrdID (unique order ID)
  55=AAPL      : Symbol
  54=1/2       : Side (1=Buy, 2=Sell)
  44=150.50    : Price
  38=100       : Quantity
  40=2         : OrderType (2=Limit)

Environment:
  SERVER_HOST  : Gateway host (default: localhost)
  SERVER_PORT  : Gateway port (default: 8080)
  RUST_LOG     : Log level filter"#;

/// What the client binary was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMode {
    Single(String),
    File(PathBuf),
    Interactive,
}

impl ClientMode {
    /// Parse arguments, excluding the program name
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let option = args
            .next()
            .ok_or_else(|| Error::Usage("no mode given".to_string()))?;

        match option.as_str() {
            "-i" => Ok(Self::Interactive),
            "-o" => args
                .next()
                .map(Self::Single)
                .ok_or_else(|| Error::Usage("-o requires a message".to_string())),
            "-f" => args
                .next()
                .map(|path| Self::File(PathBuf::from(path)))
                .ok_or_else(|| Error::Usage("-f requires a file path".to_string())),
            other => Err(Error::Usage(format!("unknown option '{other}'"))),
        }
    }
}

/// Sequential client order ids: ORD000001, ORD000002, ...
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    last: AtomicU32,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let n = self.last.fetch_add(1, Ordering::Relaxed) + 1;
        format!("ORD{n:06}")
    }
}

/// `SYMBOL SIDE PRICE QTY`, e.g. `AAPL BUY 150.50 100`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleOrder {
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
}

impl SimpleOrder {
    /// Limit order wire message with the price rounded to two decimals
    pub fn to_wire(&self, order_id: &str) -> String {
        let mut fields = FieldSet::new();
        fields.insert(tags::MSG_TYPE, tags::msg_types::NEW_ORDER_SINGLE);
        fields.insert(tags::SENDER_COMP_ID, "SENDER");
        fields.insert(tags::TARGET_COMP_ID, "TARGET");
        fields.insert(tags::CL_ORD_ID, order_id);
        fields.insert(tags::SYMBOL, self.symbol.as_str());
        fields.insert(tags::SIDE, self.side.fix_code());
        fields.insert(tags::PRICE, format!("{:.2}", self.price.round_dp(2)));
        fields.insert(tags::ORDER_QTY, self.quantity.to_string());
        fields.insert(tags::ORD_TYPE, tags::ord_types::LIMIT);
        encode(&fields)
    }
}

impl FromStr for SimpleOrder {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let [symbol, side, price, quantity] = parts.as_slice() else {
            return Err(Error::InvalidOrder(
                "use: SYMBOL SIDE PRICE QUANTITY".to_string(),
            ));
        };

        let side = Side::parse_name(side)
            .ok_or_else(|| Error::InvalidOrder(format!("unknown side '{side}'")))?;
        let price = Decimal::from_str(price)
            .map_err(|_| Error::InvalidOrder(format!("invalid price '{price}'")))?;
        let quantity = quantity
            .parse::<u64>()
            .map_err(|_| Error::InvalidOrder(format!("invalid quantity '{quantity}'")))?;

        Ok(Self {
            symbol: symbol.to_string(),
            side,
            price,
            quantity,
        })
    }
}

/// One field per line, for display in the terminal
pub fn format_response(response: &str) -> String {
    let mut out = String::from("\nServer Response:\n---------------\n");
    match OrderResponse::parse(response) {
        Some(OrderResponse::Ack(ack)) => {
            out.push_str(&format!("OrderID={}\n", ack.order_id));
            out.push_str(&format!("Symbol={}\n", ack.symbol));
            out.push_str(&format!("Side={}\n", ack.side));
            out.push_str(&format!("Quantity={}\n", ack.quantity));
            out.push_str(&format!("Price={}\n", ack.price));
            out.push_str(&format!("Status: {GREEN}ACCEPTED{RESET}\n"));
            let micros = ack.processing_time.as_micros();
            out.push_str(&format!("Processing Time: {micros:>8} microseconds\n"));
        }
        Some(OrderResponse::Nak { error }) => {
            out.push_str(&format!("Error={error}\n"));
            out.push_str(&format!("Status: {RED}REJECTED{RESET}\n"));
        }
        // Not a line this server writes; show it as received
        None => {
            for token in response.split('|').filter(|t| !t.is_empty()) {
                out.push_str(token);
                out.push('\n');
            }
        }
    }
    out.push_str("---------------");
    out
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
