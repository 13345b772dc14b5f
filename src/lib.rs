//! HyperFill MCP gateway.
//!
//! Exposes the HyperFill trading vault on Aptos testnet as five logical MCP
//! servers (executive, market analyzer, pricer, strategist and vault), each a
//! named catalog of tools routed to one adapter.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, logical servers, sessions and transports
//! - **domains**: the adapters and the tool catalogs built on them
//!   - **chain**: Aptos node REST client used for view calls and account resources
//!   - **trading**: order placement, positions and the portfolio cache
//!   - **market**: prices, order books and derived metrics
//!   - **decision**: LLM-backed strategy documents with deterministic fallbacks
//!   - **vault**: vault statistics, arbitrage scan and action simulation
//!   - **tools**: registry, dispatcher and response envelope
//!
//! # Example
//!
//! ```rust,no_run
//! use hyperfill_mcp::core::{Config, TransportService, build_hosted_servers};
//! use hyperfill_mcp::domains::Backends;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let backends = Backends::from_config(&config)?;
//!     let bindings = build_hosted_servers(&config, &backends)?;
//!     TransportService::new(config.transport).run(bindings).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

pub use core::{Config, Error, Result};
