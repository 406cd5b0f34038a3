//! Integration test: interactive order syntax through a live gateway

use fixgate_core::Message;
use fixgate_gateway::{ClientConfig, GatewayClient, GatewayServer, ServerConfig};
use fixgate_order_manager::OrderStore;
use fixgate_runner::{OrderIdGenerator, SimpleOrder, format_response};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_simple_orders_reach_the_store() {
    let _ = env_logger::try_init();

    let store = Arc::new(OrderStore::new());
    let server = Arc::new(
        GatewayServer::bind(
            ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            Arc::clone(&store),
        )
        .unwrap(),
    );
    let runner = Arc::clone(&server);
    thread::spawn(move || runner.start());
    assert!(wait_until(|| server.is_running()));

    let client = GatewayClient::new(ClientConfig::new("127.0.0.1", server.local_addr().port()));
    let ids = OrderIdGenerator::new();

    for input in ["AAPL BUY 150.50 100", "MSFT sell 300.1 25"] {
        let order: SimpleOrder = input.parse().unwrap();
        let response = client.request(&Message::fix(order.to_wire(&ids.next_id()))).unwrap();
        assert!(format_response(&response).contains("ACCEPTED"));
    }

    assert!(wait_until(|| store.len() == 2));
    let snapshot = store.snapshot();
    assert_eq!(snapshot[0].0, "ORD000001");
    assert!(snapshot[0].1.contains("|44=150.50|54=1|55=AAPL|"));
    assert!(snapshot[1].1.contains("|44=300.10|54=2|55=MSFT|"));

    server.stop();
}
