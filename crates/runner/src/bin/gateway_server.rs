use fixgate_gateway::{Dispatcher, GatewayServer};
use fixgate_order_manager::{MarketDataProcessor, OrderStore};
use fixgate_runner::{init_logging, server_config};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

fn print_help() {
    eprintln!(
        r#"Fixgate gateway server

USAGE:
    gateway-server [OPTIONS]

OPTIONS:
    --config <PATH>     Load server configuration from a JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    GATEWAY_PORT        Listen port (default: 8080)
    RUST_LOG            Log level filter (default: info)
"#
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                };
                config_path = Some(PathBuf::from(path));
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = server_config(config_path.as_deref())?;
    info!(
        "Starting gateway: port={} workers={} max_connections={}",
        config.port, config.thread_pool_size, config.max_connections
    );

    let store = Arc::new(OrderStore::new());
    let market_data = Arc::new(MarketDataProcessor::new());
    let dispatcher = Dispatcher::new(Arc::clone(&store)).with_market_data(Arc::clone(&market_data));
    let server = Arc::new(GatewayServer::with_dispatcher(config, dispatcher)?);

    let event_loop = {
        let server = Arc::clone(&server);
        std::thread::Builder::new()
            .name("gateway-event-loop".to_string())
            .spawn(move || server.start())?
    };

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                if event_loop.is_finished() {
                    error!("Event loop exited unexpectedly");
                    break;
                }
                let stats = server.statistics();
                info!(
                    "Stats: active_connections={} messages_processed={} errors={} \
                     avg_processing={}us orders={} pending={}",
                    stats.active_connections,
                    stats.messages_processed,
                    stats.errors_encountered,
                    stats.average_processing_time.as_micros(),
                    store.len(),
                    server.pending_messages()
                );
            }
        }
    }

    server.stop();
    let outcome = match event_loop.join() {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err("event loop thread panicked".into()),
    };

    info!(
        "Gateway shut down with {} orders and {} market data updates",
        store.len(),
        market_data.len()
    );
    log::logger().flush();
    outcome
}
