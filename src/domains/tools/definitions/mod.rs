//! Tool definitions, one file per logical server.
//!
//! Each file declares its parameter structs and a `registry()` that binds
//! every tool to the adapter method it calls.

pub mod executive;
pub mod market;
pub mod pricer;
pub mod strategist;
pub mod vault;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::{ToolDispatcher, ToolError, ToolService};
use crate::core::config::ServerVariant;
use crate::domains::Backends;

/// Parameters of a tool that takes no arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct EmptyParams {}

/// Build the dispatcher for one logical server over the shared backends.
pub fn build_tool_service(
    variant: ServerVariant,
    backends: &Backends,
) -> Result<Arc<dyn ToolService>, ToolError> {
    let service: Arc<dyn ToolService> = match variant {
        ServerVariant::Executive => Arc::new(ToolDispatcher::new(
            executive::registry()?,
            backends.trader.clone(),
        )),
        ServerVariant::Pricer => Arc::new(ToolDispatcher::new(
            pricer::registry()?,
            backends.trader.clone(),
        )),
        ServerVariant::MarketAnalyzer => Arc::new(ToolDispatcher::new(
            market::registry()?,
            backends.markets.clone(),
        )),
        ServerVariant::Strategist => Arc::new(ToolDispatcher::new(
            strategist::registry()?,
            backends.decision.clone(),
        )),
        ServerVariant::Vault => Arc::new(ToolDispatcher::new(
            vault::registry()?,
            backends.vault.clone(),
        )),
    };
    Ok(service)
}
