//! Fixgate Runner
//!
//! Process glue shared by the two binaries:
//!
//! - **Bootstrap**: logger construction, config loading, environment overrides
//! - **CLI**: argument parsing, the simplified order syntax, response formatting
//!
//! ```text
//!   fix-client ──TCP──► gateway-server
//!       │                    │
//!   GatewayClient       GatewayServer ──► OrderStore
//! ```

pub mod bootstrap;
pub mod cli;
pub mod error;

pub use bootstrap::{client_config, init_logging, server_config};
pub use cli::{ClientMode, OrderIdGenerator, SimpleOrder, format_response};
pub use error::{Error, Result};
