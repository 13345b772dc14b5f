//! Configuration management for the gateway.
//!
//! One [`Config`] is built at startup, from defaults overridden by environment
//! variables (a `.env` file is honoured), and handed to components when they
//! are constructed.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::transport::TransportConfig;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Process identification.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Logical servers hosted by this process.
    pub servers: ServersConfig,

    /// Aptos fullnode and vault contract.
    pub chain: ChainConfig,

    /// Price feed.
    pub market: MarketConfig,

    /// Completion backend and models.
    pub decision: DecisionConfig,

    /// Outbound call limits.
    pub network: NetworkConfig,

    /// External API credentials.
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Process name shown in logs and the root endpoint.
    pub name: String,

    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

// ============================================================================
// Logical servers
// ============================================================================

/// One of the logical MCP servers a process can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerVariant {
    Executive,
    MarketAnalyzer,
    Pricer,
    Strategist,
    Vault,
}

impl ServerVariant {
    pub fn all() -> &'static [ServerVariant] {
        &[
            Self::Executive,
            Self::MarketAnalyzer,
            Self::Pricer,
            Self::Strategist,
            Self::Vault,
        ]
    }

    /// Name reported to clients in `initialize`.
    pub fn server_name(self) -> &'static str {
        match self {
            Self::Executive => "executive-server",
            Self::MarketAnalyzer => "market-analyzer-server",
            Self::Pricer => "pricer-server",
            Self::Strategist => "strategist-server",
            Self::Vault => "hyperfill-mcp-server",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Executive => 1000,
            Self::MarketAnalyzer => 2000,
            Self::Pricer => 3000,
            Self::Strategist => 4000,
            Self::Vault => 5000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Executive => "executive",
            Self::MarketAnalyzer => "market_analyzer",
            Self::Pricer => "pricer",
            Self::Strategist => "strategist",
            Self::Vault => "vault",
        }
    }

    /// Name of the variable overriding this server's port.
    pub fn port_env_var(self) -> String {
        format!("MCP_{}_PORT", self.as_str().to_uppercase())
    }
}

impl fmt::Display for ServerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| format!("unknown server variant: {s}"))
    }
}

/// A hosted logical server and its HTTP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub variant: ServerVariant,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServersConfig {
    /// Enabled servers in startup order.
    pub endpoints: Vec<ServerEndpoint>,
}

impl Default for ServersConfig {
    fn default() -> Self {
        Self {
            endpoints: ServerVariant::all()
                .iter()
                .map(|&variant| ServerEndpoint {
                    variant,
                    port: variant.default_port(),
                })
                .collect(),
        }
    }
}

impl ServersConfig {
    pub fn is_enabled(&self, variant: ServerVariant) -> bool {
        self.endpoints.iter().any(|e| e.variant == variant)
    }

    pub fn port(&self, variant: ServerVariant) -> Option<u16> {
        self.endpoints
            .iter()
            .find(|e| e.variant == variant)
            .map(|e| e.port)
    }

    fn from_env() -> Self {
        let enabled: Vec<ServerVariant> = match std::env::var("MCP_SERVERS") {
            Ok(list) if !list.trim().is_empty() => list
                .split(',')
                .filter_map(|name| name.parse().ok())
                .collect(),
            _ => ServerVariant::all().to_vec(),
        };

        let mut endpoints = Vec::with_capacity(enabled.len());
        for variant in enabled {
            if endpoints.iter().any(|e: &ServerEndpoint| e.variant == variant) {
                continue;
            }
            let port = env_parse(&variant.port_env_var()).unwrap_or(variant.default_port());
            endpoints.push(ServerEndpoint { variant, port });
        }
        Self { endpoints }
    }
}

// ============================================================================
// Backends
// ============================================================================

pub const TESTNET_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";
pub const DEFAULT_VAULT_ADDRESS: &str =
    "0x96d2b185a5b581f98dc1df57b59a5875eb53b3a65ef7a9b0d5e42aa44c3b8b82";
pub const DEFAULT_STATS_VAULT_ADDRESS: &str =
    "0xe22a7dbf85b88f1c950b96923e29f0213121002f296c0572549f2a6a7e7fd6f5";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Fullnode REST base URL.
    pub node_url: String,

    /// Trading account address; account-bound calls fail without it.
    pub account: Option<String>,

    /// Vault contract the trader allocates from.
    pub vault_address: String,

    /// Vault contract read by the vault server.
    pub stats_vault_address: String,

    pub default_leverage: f64,

    /// Percent.
    pub default_slippage: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            node_url: TESTNET_NODE_URL.to_string(),
            account: None,
            vault_address: DEFAULT_VAULT_ADDRESS.to_string(),
            stats_vault_address: DEFAULT_STATS_VAULT_ADDRESS.to_string(),
            default_leverage: 1.1,
            default_slippage: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// CoinGecko API base URL.
    pub price_feed_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            price_feed_url: "https://api.coingecko.com/api/v3".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// OpenAI-compatible completions base URL.
    pub base_url: String,

    pub strategy_model: String,
    pub risk_model: String,
    pub execution_model: String,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            strategy_model: "llama3-70b-8192".to_string(),
            risk_model: "llama3-8b-8192".to_string(),
            execution_model: "llama3-8b-8192".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Upper bound for every outbound call, in seconds.
    pub external_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            external_timeout_secs: 5,
        }
    }
}

impl NetworkConfig {
    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs.max(1))
    }
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Groq API key for the decision engine.
    pub groq_api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field(
                "groq_api_key",
                &self.groq_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "hyperfill".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            servers: ServersConfig::default(),
            chain: ChainConfig::default(),
            market: MarketConfig::default(),
            decision: DecisionConfig::default(),
            network: NetworkConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_string("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = env_string("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();
        config.servers = ServersConfig::from_env();

        if let Some(url) = env_string("APTOS_NODE_URL") {
            config.chain.node_url = url;
        }
        config.chain.account = env_string("HYPERFILL_ACCOUNT");
        if let Some(address) = env_string("HYPERFILL_VAULT_ADDRESS") {
            config.chain.vault_address = address;
        }
        if let Some(address) = env_string("HYPERFILL_STATS_VAULT_ADDRESS") {
            config.chain.stats_vault_address = address;
        }
        if let Some(leverage) = env_parse("HYPERFILL_DEFAULT_LEVERAGE") {
            config.chain.default_leverage = leverage;
        }
        if let Some(slippage) = env_parse("HYPERFILL_DEFAULT_SLIPPAGE") {
            config.chain.default_slippage = slippage;
        }

        if let Some(url) = env_string("COINGECKO_BASE_URL") {
            config.market.price_feed_url = url;
        }

        if let Some(url) = env_string("GROQ_BASE_URL") {
            config.decision.base_url = url;
        }
        if let Some(model) = env_string("GROQ_STRATEGY_MODEL") {
            config.decision.strategy_model = model;
        }
        if let Some(model) = env_string("GROQ_RISK_MODEL") {
            config.decision.risk_model = model;
        }
        if let Some(model) = env_string("GROQ_EXECUTION_MODEL") {
            config.decision.execution_model = model;
        }

        if let Some(secs) = env_parse("MCP_EXTERNAL_TIMEOUT_SECS") {
            config.network.external_timeout_secs = secs;
        }

        config.credentials.groq_api_key = env_string("GROQ_API_KEY");

        config
    }
}
