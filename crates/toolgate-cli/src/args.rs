//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolgate_core::LogFormat;

#[derive(Parser)]
#[command(name = "toolgate")]
#[command(about = "Streaming tool server with bounded execution and response caching")]
#[command(version)]
pub struct Cli {
    /// Path to a YAML, TOML or JSON configuration file
    #[arg(long, short, global = true, env = "TOOLGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Command to run (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Serve JSON-RPC requests over stdin/stdout, or over HTTP with `--http`
    Serve {
        /// Listen on HTTP instead of stdio; without a value the configured
        /// address is used
        #[arg(long, value_name = "ADDR")]
        http: Option<Option<String>>,
    },

    /// List registered tools
    Tools,

    /// Call a tool once and print the JSON-RPC response
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Run a streaming tool and print its events as SSE blocks
    Stream {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}
