//! Order Store concurrency test
//!
//! Many writer threads hammer the store through the wire path while readers
//! poll it, mirroring how the gateway worker pool uses it.

use fixgate_order_manager::{Error, OrderStore, Upsert};
use std::sync::Arc;
use std::thread;

fn new_order(id: &str, qty: u32) -> String {
    format!("35=D|49=S|56=T|11={id}|55=AAPL|54=1|44=150.50|38={qty}|40=2|")
}

#[test]
fn test_concurrent_upserts_on_distinct_ids() {
    let _ = env_logger::try_init();

    let store = Arc::new(OrderStore::new());
    let writers: Vec<_> = (0..8)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..250 {
                    let id = format!("W{w}-{i}");
                    assert_eq!(
                        store.process_from_wire(&new_order(&id, i)).unwrap(),
                        Upsert::Created
                    );
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 8 * 250);
    assert_eq!(store.get("W3-17"), Some(new_order("W3-17", 17)));
}

#[test]
fn test_sequential_amendments_keep_last_write() {
    let store = OrderStore::new();
    for qty in 1..=10 {
        store.process_from_wire(&new_order("O1", qty)).unwrap();
    }

    assert_eq!(store.get("O1"), Some(new_order("O1", 10)));
}

#[test]
fn test_create_and_wire_paths_share_ids() {
    let store = OrderStore::new();
    store.process_from_wire(&new_order("O1", 100)).unwrap();

    // The direct API still refuses duplicates created by the wire path.
    assert_eq!(
        store.create("O1", "manual").unwrap_err(),
        Error::AlreadyExists("O1".to_string())
    );

    store.cancel("O1").unwrap();
    store.create("O1", "manual").unwrap();
    assert_eq!(store.get("O1").as_deref(), Some("manual"));
}
