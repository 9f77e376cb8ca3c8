//! Daemon entry point for the context engine MCP server.
//!
//! Loads configuration from the command line and environment, connects the
//! configured node store, and serves the MCP protocol over stdio and/or
//! streamable HTTP.

mod backend;
mod config;

use tracing_subscriber::EnvFilter;

use crate::config::KgConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = KgConfig::from_args()?;
    backend::run(config).await
}
