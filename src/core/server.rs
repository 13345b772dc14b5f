//! Logical MCP servers and their rmcp handler.
//!
//! A [`HostedServer`] pairs one [`ServerVariant`] with the tool service built
//! for it. The HTTP transport serves it directly; the stdio transport wraps it
//! in an [`McpServer`] bound to the single stdio session.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use tracing::{info, instrument};

use super::config::{Config, ServerVariant};
use super::error::Result;
use super::session::SessionContext;
use crate::domains::Backends;
use crate::domains::tools::{ToolCallRequest, ToolService, build_tool_service};

/// One logical server: identity plus tool service.
#[derive(Clone)]
pub struct HostedServer {
    variant: ServerVariant,
    version: String,
    tools: Arc<dyn ToolService>,
}

impl HostedServer {
    pub fn new(variant: ServerVariant, version: impl Into<String>, tools: Arc<dyn ToolService>) -> Self {
        Self {
            variant,
            version: version.into(),
            tools,
        }
    }

    pub fn variant(&self) -> ServerVariant {
        self.variant
    }

    pub fn name(&self) -> &'static str {
        self.variant.server_name()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tools(&self) -> &Arc<dyn ToolService> {
        &self.tools
    }

    fn instructions(&self) -> &'static str {
        match self.variant {
            ServerVariant::Executive => {
                "Places and manages orders and positions on the HyperFill vault (Aptos testnet)."
            }
            ServerVariant::MarketAnalyzer => {
                "Market data, order books and derived trend, volatility and sentiment metrics."
            }
            ServerVariant::Pricer => "Portfolio reads: assets, open orders, positions, balance and trade history.",
            ServerVariant::Strategist => {
                "AI trading decisions, risk parameters and execution plans with safe fallbacks."
            }
            ServerVariant::Vault => "HyperFill vault statistics, market data, arbitrage scan and action simulation.",
        }
    }

    /// Result of `initialize` for this server.
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions().to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}

/// A hosted server and the port it listens on.
#[derive(Clone)]
pub struct ServerBinding {
    pub server: HostedServer,
    pub port: u16,
}

/// Build every enabled logical server over one set of backends.
pub fn build_hosted_servers(config: &Config, backends: &Backends) -> Result<Vec<ServerBinding>> {
    config
        .servers
        .endpoints
        .iter()
        .map(|endpoint| {
            let tools = build_tool_service(endpoint.variant, backends)?;
            info!(
                server = endpoint.variant.server_name(),
                tools = tools.list_tools().len(),
                "Logical server ready"
            );
            Ok(ServerBinding {
                server: HostedServer::new(endpoint.variant, &config.server.version, tools),
                port: endpoint.port,
            })
        })
        .collect()
}

/// rmcp handler for one hosted server bound to one session.
#[derive(Clone)]
pub struct McpServer {
    hosted: HostedServer,
    session: Arc<SessionContext>,
}

impl McpServer {
    pub fn new(hosted: HostedServer, session: Arc<SessionContext>) -> Self {
        Self { hosted, session }
    }

    pub fn name(&self) -> &str {
        self.hosted.name()
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        self.hosted.server_info()
    }

    #[instrument(skip_all, fields(server = %self.name()))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        self.session.touch();
        let tools = self
            .hosted
            .tools()
            .list_tools()
            .iter()
            .map(|def| def.to_tool())
            .collect();
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.session.touch();
        let arguments = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Null);
        let response = self
            .hosted
            .tools()
            .call_tool(ToolCallRequest::new(request.name, arguments), &self.session)
            .await;
        Ok(response.into())
    }
}
