use std::env;
use std::sync::Arc;

use gdrive_hpc_mcp::config::Config;
use gdrive_hpc_mcp::error::Result;
use gdrive_hpc_mcp::mcp::run_stdio;
use gdrive_hpc_mcp::setup;
use gdrive_hpc_mcp::tools::ToolHandler;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout belongs to the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = Config::default();

    match args.get(1).map(String::as_str) {
        Some("configure") => setup::run_configure(),
        Some("auth-test") => setup::run_auth_test(&config).await,
        Some("serve") | None => {
            eprintln!("gdrive-hpc-mcp starting (token: {})", config.token_path.display());
            let handler = Arc::new(ToolHandler::new(config));
            run_stdio(handler).await
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            eprintln!("Usage: {} [serve|configure|auth-test]", args[0]);
            std::process::exit(2);
        }
    }
}
