//! Gateway entry point.
//!
//! Initializes logging, loads configuration, builds the shared backends and
//! every enabled logical server, then runs the configured transport.

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use hyperfill_mcp::core::{Config, TransportService, build_hosted_servers};
use hyperfill_mcp::domains::Backends;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment (and .env if present)
    let config = Config::from_env();

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    if let Err(e) = run(config).await {
        error!("Startup failed: {:#}", e);
        return Err(e);
    }

    info!("Server shutting down");
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let backends = Backends::from_config(&config)?;
    let bindings = build_hosted_servers(&config, &backends)?;
    info!("{} logical server(s) initialized", bindings.len());

    TransportService::new(config.transport).run(bindings).await?;
    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so the STDIO transport keeps stdout for protocol traffic.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
