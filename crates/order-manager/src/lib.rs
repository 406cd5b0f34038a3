//! Fixgate Order Manager
//!
//! Owns the in-memory order state the gateway worker pool writes into:
//! - **Order Store**: order id (FIX tag 11) -> raw message text that created
//!   or last modified the order
//! - **Market Data Processor**: append-only record of market data payloads
//!
//! ## Architecture
//!
//! ```text
//!  Gateway workers ──► process_sequenced (upsert) ──┐
//!                                                    ▼
//!  Direct callers  ──► create / modify / cancel ──► OrderStore ──► get / exists
//! ```
//!
//! The raw message text is the source of truth; callers only ever receive
//! copies of what is stored.

pub mod error;
pub mod market_data;
pub mod store;

// Re-export main types
pub use error::{Error, Result};
pub use market_data::MarketDataProcessor;
pub use store::{OrderStore, Upsert};
