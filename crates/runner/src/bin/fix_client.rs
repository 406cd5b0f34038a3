use fixgate_core::{Message, MessageKind};
use fixgate_gateway::{ClientError, GatewayClient};
use fixgate_runner::cli::USAGE;
use fixgate_runner::{
    ClientMode, OrderIdGenerator, SimpleOrder, client_config, format_response, init_logging,
};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    init_logging();

    let mode = match ClientMode::from_args(std::env::args().skip(1)) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let config = match client_config(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = GatewayClient::new(config);
    if !client.connect() {
        eprintln!("Failed to connect to server: {}", client.last_error());
        return ExitCode::FAILURE;
    }

    let code = match mode {
        ClientMode::Single(payload) => send_one(&client, &payload, "Order"),
        ClientMode::File(path) => match client.send_file(&path, MessageKind::Fix) {
            Ok(summary) if summary.all_succeeded() => {
                println!("File processed successfully ({} messages)", summary.sent);
                ExitCode::SUCCESS
            }
            Ok(summary) => {
                println!(
                    "Failed to process file: {} of {} messages failed. Last error: {}",
                    summary.failed,
                    summary.attempted(),
                    client.last_error()
                );
                ExitCode::FAILURE
            }
            Err(e) => {
                println!("Failed to process file: {}", e);
                ExitCode::FAILURE
            }
        },
        ClientMode::Interactive => match interactive(&client) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    };

    client.disconnect();
    log::logger().flush();
    code
}

fn send_one(client: &GatewayClient, payload: &str, what: &str) -> ExitCode {
    match client.request(&Message::fix(payload)) {
        Ok(response) => {
            println!("{}", format_response(&response));
            println!("{} sent successfully", what);
            ExitCode::SUCCESS
        }
        Err(ClientError::Rejected(response)) => {
            println!("{}", format_response(&response));
            println!("{} rejected", what);
            ExitCode::FAILURE
        }
        Err(e) => {
            println!("Failed to send {}: {}", what.to_lowercase(), e);
            ExitCode::FAILURE
        }
    }
}

fn interactive(client: &GatewayClient) -> io::Result<()> {
    println!(
        "Interactive FIX Message Mode\n\
         Enter 'help' for message format, 'quit' to exit\n\
         Or use the simplified format: <symbol> <side> <price> <quantity>\n\
         Example: AAPL BUY 150.50 100"
    );

    let ids = OrderIdGenerator::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nEnter order (or command): ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(());
        };
        let input = line.trim();

        match input {
            "" => continue,
            "quit" => return Ok(()),
            "help" => {
                println!("{}", USAGE);
                continue;
            }
            _ => {}
        }

        let payload = if input.contains('|') {
            input.to_string()
        } else {
            match input.parse::<SimpleOrder>() {
                Ok(order) => order.to_wire(&ids.next_id()),
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            }
        };

        send_one(client, &payload, "Message");
    }
}
