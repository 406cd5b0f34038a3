//! Order Store
//!
//! Thread-safe map from order id to the raw message text that produced or
//! last modified the order. Every operation holds the map lock for its whole
//! duration.
//!
//! The two write paths differ on duplicates:
//! - [`OrderStore::create`] rejects a duplicate id
//! - [`OrderStore::process_from_wire`] upserts, so resending a message with
//!   the same id amends the order
//!
//! Wire messages applied by a worker pool carry the sequence number they were
//! queued with ([`OrderStore::process_sequenced`]). A record remembers the
//! sequence that last wrote it and refuses older ones, so two workers racing
//! on the same id cannot let an earlier amendment overwrite a later one.

use crate::error::{Error, Result};
use fixgate_core::{decode, tags};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Outcome of a wire upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The id was new and the order was inserted
    Created,
    /// The id existed and its details were overwritten
    Replaced,
    /// A later sequence already wrote this id; the message was dropped
    Stale,
}

#[derive(Debug)]
struct OrderRecord {
    details: String,
    /// Queue sequence of the last wire message applied, if any
    wire_seq: Option<u64>,
}

/// Order id -> order details (raw message text)
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Mutex<HashMap<String, OrderRecord>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new order; fails with [`Error::AlreadyExists`] if `id` is active
    pub fn create(&self, id: &str, details: &str) -> Result<()> {
        let mut orders = self.orders.lock();
        if orders.contains_key(id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        orders.insert(
            id.to_string(),
            OrderRecord {
                details: details.to_string(),
                wire_seq: None,
            },
        );
        debug!("Order {} created", id);
        Ok(())
    }

    /// Copy of the details stored for `id`; absence is a normal outcome
    pub fn get(&self, id: &str) -> Option<String> {
        self.orders.lock().get(id).map(|r| r.details.clone())
    }

    /// Decode a wire message and upsert it under its tag 11 value.
    ///
    /// Fails with [`Error::MissingOrderId`] (store unchanged) when the message
    /// has no tag 11, or [`Error::Protocol`] when it does not decode.
    pub fn process_from_wire(&self, raw: &str) -> Result<Upsert> {
        self.upsert(raw, None)
    }

    /// Like [`process_from_wire`](Self::process_from_wire), but ignored with
    /// [`Upsert::Stale`] if the id was last written by a higher `seq`
    pub fn process_sequenced(&self, raw: &str, seq: u64) -> Result<Upsert> {
        self.upsert(raw, Some(seq))
    }

    fn upsert(&self, raw: &str, seq: Option<u64>) -> Result<Upsert> {
        let fields = decode(raw)?;
        let id = fields.get(tags::CL_ORD_ID).ok_or(Error::MissingOrderId)?;

        let mut orders = self.orders.lock();
        let outcome = match orders.get_mut(id) {
            Some(record) if seq.is_some() && record.wire_seq > seq => Upsert::Stale,
            Some(record) => {
                record.details = raw.to_string();
                record.wire_seq = seq.or(record.wire_seq);
                Upsert::Replaced
            }
            None => {
                orders.insert(
                    id.to_string(),
                    OrderRecord {
                        details: raw.to_string(),
                        wire_seq: seq,
                    },
                );
                Upsert::Created
            }
        };
        drop(orders);

        debug!("Order {} processed from wire ({:?})", id, outcome);
        Ok(outcome)
    }

    /// Overwrite the details of an active order
    pub fn modify(&self, id: &str, details: &str) -> Result<()> {
        let mut orders = self.orders.lock();
        let record = orders
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        record.details = details.to_string();
        debug!("Order {} modified", id);
        Ok(())
    }

    /// Remove an active order, returning its last details
    pub fn cancel(&self, id: &str) -> Result<String> {
        let removed = self
            .orders
            .lock()
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        debug!("Order {} cancelled", id);
        Ok(removed.details)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.orders.lock().contains_key(id)
    }

    /// Number of active orders
    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }

    /// Copy of every active order, sorted by id
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut all: Vec<_> = self
            .orders
            .lock()
            .iter()
            .map(|(id, record)| (id.clone(), record.details.clone()))
            .collect();
        all.sort();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixgate_core::ProtocolError;

    const ORDER_O1: &str = "35=D|49=S|56=T|11=O1|55=AAPL|54=1|44=150.50|38=100|40=2|";

    #[test]
    fn test_create_then_get() {
        let store = OrderStore::new();
        store.create("1", "Buy 100 Bonds at 99.5").unwrap();
        assert_eq!(store.get("1").as_deref(), Some("Buy 100 Bonds at 99.5"));
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = OrderStore::new();
        store.create("1", "first").unwrap();

        let err = store.create("1", "second").unwrap_err();
        assert_eq!(err, Error::AlreadyExists("1".to_string()));
        assert_eq!(store.get("1").as_deref(), Some("first"));
    }

    #[test]
    fn test_cancel_removes_order() {
        let store = OrderStore::new();
        store.create("1", "details").unwrap();

        assert_eq!(store.cancel("1").unwrap(), "details");
        assert!(!store.exists("1"));
        assert!(store.get("1").is_none());
    }

    #[test]
    fn test_cancel_unknown_fails() {
        let store = OrderStore::new();
        assert_eq!(
            store.cancel("missing").unwrap_err(),
            Error::NotFound("missing".to_string())
        );
    }

    #[test]
    fn test_modify() {
        let store = OrderStore::new();
        assert_eq!(
            store.modify("1", "x").unwrap_err(),
            Error::NotFound("1".to_string())
        );

        store.create("1", "old").unwrap();
        store.modify("1", "new").unwrap();
        assert_eq!(store.get("1").as_deref(), Some("new"));
    }

    #[test]
    fn test_process_from_wire_upserts() {
        let store = OrderStore::new();
        assert_eq!(store.process_from_wire(ORDER_O1).unwrap(), Upsert::Created);
        assert_eq!(store.get("O1").as_deref(), Some(ORDER_O1));

        let amended = "35=D|11=O1|55=AAPL|54=1|44=151.00|38=50|";
        assert_eq!(store.process_from_wire(amended).unwrap(), Upsert::Replaced);
        assert_eq!(store.get("O1").as_deref(), Some(amended));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_process_from_wire_missing_id_leaves_store_unchanged() {
        let store = OrderStore::new();
        store.create("X", "keep").unwrap();

        let err = store.process_from_wire("35=D|55=AAPL|54=1|").unwrap_err();
        assert_eq!(err, Error::MissingOrderId);
        assert_eq!(store.snapshot(), vec![("X".to_string(), "keep".to_string())]);
    }

    #[test]
    fn test_process_from_wire_malformed() {
        let store = OrderStore::new();
        let err = store.process_from_wire("11=O1|oops|").unwrap_err();
        assert_eq!(
            err,
            Error::Protocol(ProtocolError::MalformedField("oops".to_string()))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_older_sequence_does_not_overwrite_newer() {
        let store = OrderStore::new();
        let newer = "35=D|11=O1|55=AAPL|38=2|";
        let older = "35=D|11=O1|55=AAPL|38=1|";

        assert_eq!(store.process_sequenced(newer, 8).unwrap(), Upsert::Created);
        assert_eq!(store.process_sequenced(older, 7).unwrap(), Upsert::Stale);
        assert_eq!(store.get("O1").as_deref(), Some(newer));

        let latest = "35=D|11=O1|55=AAPL|38=3|";
        assert_eq!(store.process_sequenced(latest, 9).unwrap(), Upsert::Replaced);
        assert_eq!(store.get("O1").as_deref(), Some(latest));
    }

    #[test]
    fn test_unsequenced_writes_keep_last_sequence() {
        let store = OrderStore::new();
        store.process_sequenced("11=O1|38=5|", 5).unwrap();
        store.process_from_wire("11=O1|38=6|").unwrap();
        store.modify("O1", "manual").unwrap();

        // Direct writes do not reset the guard against older queued messages
        assert_eq!(store.process_sequenced("11=O1|38=4|", 4).unwrap(), Upsert::Stale);
        assert_eq!(store.get("O1").as_deref(), Some("manual"));
    }
}
