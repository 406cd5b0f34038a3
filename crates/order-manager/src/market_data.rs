//! Market Data Processor
//!
//! Append-only record of market data payloads. The gateway's worker handler
//! table can route MARKET_DATA envelopes here.

use log::debug;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct MarketDataProcessor {
    processed: Mutex<Vec<String>>,
}

impl MarketDataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one market data payload
    pub fn process(&self, data: &str) {
        let mut processed = self.processed.lock();
        processed.push(data.to_string());
        debug!("Market data recorded ({} total)", processed.len());
    }

    /// Copy of everything recorded so far, in arrival order
    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.processed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.lock().is_empty()
    }
}
