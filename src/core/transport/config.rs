//! Transport configuration types.

use serde::{Deserialize, Serialize};

#[cfg(feature = "stdio")]
use crate::core::config::ServerVariant;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// One logical server over standard input/output.
    #[cfg(feature = "stdio")]
    Stdio(StdioConfig),

    /// Every enabled logical server on its own HTTP port.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// STDIO transport configuration.
#[cfg(feature = "stdio")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdioConfig {
    /// Logical server bound to stdin/stdout.
    pub server: ServerVariant,
}

/// HTTP transport configuration; ports come from the servers section.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Close sessions idle for this long; 0 keeps them until DELETE.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
fn default_session_idle_secs() -> u64 {
    1800
}

#[cfg(feature = "http")]
impl HttpConfig {
    pub fn session_idle_timeout(&self) -> Option<std::time::Duration> {
        (self.session_idle_secs > 0).then(|| std::time::Duration::from_secs(self.session_idle_secs))
    }
}

#[cfg(feature = "stdio")]
impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            server: ServerVariant::Vault,
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "http")]
        {
            Self::Http(HttpConfig::default())
        }

        #[cfg(all(not(feature = "http"), feature = "stdio"))]
        {
            Self::Stdio(StdioConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio(server: ServerVariant) -> Self {
        Self::Stdio(StdioConfig { server })
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "stdio")]
            "stdio" => {
                let server = std::env::var("MCP_STDIO_SERVER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(ServerVariant::Vault);
                Self::Stdio(StdioConfig { server })
            }
            #[cfg(feature = "http")]
            _ => {
                let host = std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host());
                let rpc_path =
                    std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_rpc_path());
                let enable_cors = std::env::var("MCP_HTTP_CORS")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or(true);
                let session_idle_secs = std::env::var("MCP_SESSION_IDLE_SECS")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or_else(default_session_idle_secs);
                Self::Http(HttpConfig {
                    host,
                    rpc_path,
                    enable_cors,
                    session_idle_secs,
                })
            }
            #[cfg(all(not(feature = "http"), feature = "stdio"))]
            _ => Self::Stdio(StdioConfig::default()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio(cfg) => format!("STDIO serving {}", cfg.server),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {} at {}", cfg.host, cfg.rpc_path),
        }
    }

    /// Check if this transport is the STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio(_))
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}
