//! Toolgate command-line server
//!
//! ```bash
//! toolgate serve                         # JSON-RPC over stdio
//! toolgate tools                         # list registered tools
//! toolgate call echo --args '{"text":"hi"}'
//! toolgate stream countdown --args '{"from":5}'
//! ```
//!
//! Logs go to stderr. Set `RUST_LOG` to override the configured level.

mod args;
mod commands;
mod demo_tools;
mod router;

use args::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    router::route(cli).await
}
