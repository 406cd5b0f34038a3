//! Worker-side handler table
//!
//! Every [`MessageKind`] maps to exactly one handler. FIX messages go to the
//! order store; market data and control messages are logged and dropped
//! unless a handler is installed for them.
//!
//! Handlers receive the queue sequence number alongside the message so that
//! stateful handlers can discard work overtaken by a later message.

use crate::error::HandlerError;
use fixgate_core::{Message, MessageKind};
use fixgate_order_manager::{MarketDataProcessor, OrderStore, Upsert};
use log::{debug, info};
use std::sync::Arc;

/// Processes one dequeued message on a worker thread
pub trait MessageHandler: Send + Sync {
    /// `seq` is the queue sequence number; higher means pushed later
    fn handle(&self, seq: u64, message: &Message) -> Result<(), HandlerError>;
}

impl MessageHandler for OrderStore {
    fn handle(&self, seq: u64, message: &Message) -> Result<(), HandlerError> {
        match self.process_sequenced(message.payload(), seq)? {
            Upsert::Created => debug!("Order created from {}", message.payload()),
            Upsert::Replaced => debug!("Order replaced from {}", message.payload()),
            Upsert::Stale => debug!("Skipped superseded message #{}: {}", seq, message.payload()),
        }
        Ok(())
    }
}

impl MessageHandler for MarketDataProcessor {
    fn handle(&self, _seq: u64, message: &Message) -> Result<(), HandlerError> {
        self.process(message.payload());
        Ok(())
    }
}

/// Default handler for kinds nobody consumes yet
#[derive(Debug)]
struct Discard(MessageKind);

impl MessageHandler for Discard {
    fn handle(&self, _seq: u64, message: &Message) -> Result<(), HandlerError> {
        info!("Dropping {} message: {}", self.0, message.payload());
        Ok(())
    }
}

pub struct Dispatcher {
    fix: Arc<dyn MessageHandler>,
    market_data: Arc<dyn MessageHandler>,
    control: Arc<dyn MessageHandler>,
}

impl Dispatcher {
    /// FIX messages go to `store`; everything else is discarded
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self {
            fix: store,
            market_data: Arc::new(Discard(MessageKind::MarketData)),
            control: Arc::new(Discard(MessageKind::Control)),
        }
    }

    /// Route market data to `processor`
    pub fn with_market_data(self, processor: Arc<MarketDataProcessor>) -> Self {
        self.with_handler(MessageKind::MarketData, processor)
    }

    /// Replace the handler for `kind`
    pub fn with_handler(mut self, kind: MessageKind, handler: Arc<dyn MessageHandler>) -> Self {
        *self.slot_mut(kind) = handler;
        self
    }

    fn slot_mut(&mut self, kind: MessageKind) -> &mut Arc<dyn MessageHandler> {
        match kind {
            MessageKind::Fix => &mut self.fix,
            MessageKind::MarketData => &mut self.market_data,
            MessageKind::Control => &mut self.control,
        }
    }

    fn handler_for(&self, kind: MessageKind) -> &dyn MessageHandler {
        match kind {
            MessageKind::Fix => self.fix.as_ref(),
            MessageKind::MarketData => self.market_data.as_ref(),
            MessageKind::Control => self.control.as_ref(),
        }
    }

    pub fn dispatch(&self, seq: u64, message: &Message) -> Result<(), HandlerError> {
        self.handler_for(message.kind()).handle(seq, message)
    }
}
