//! Transport service - picks the configured transport and runs it.

use tracing::info;

use super::{TransportConfig, TransportResult};
use crate::core::server::ServerBinding;

#[cfg(feature = "stdio")]
use super::{TransportError, stdio::StdioTransport};

#[cfg(feature = "http")]
use super::http::HttpTransport;

/// Transport service - manages the transport layer for the hosted servers.
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Create a transport service from environment variables.
    pub fn from_env() -> Self {
        Self::new(TransportConfig::from_env())
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Start the transport. Blocks until it shuts down.
    ///
    /// HTTP serves every binding; STDIO serves the one named by its config.
    pub async fn run(self, bindings: Vec<ServerBinding>) -> TransportResult<()> {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio(cfg) => {
                let binding = bindings
                    .into_iter()
                    .find(|b| b.server.variant() == cfg.server)
                    .ok_or_else(|| {
                        TransportError::init(format!("server '{}' is not enabled", cfg.server))
                    })?;
                StdioTransport::run(binding.server).await
            }
            #[cfg(feature = "http")]
            TransportConfig::Http(cfg) => HttpTransport::new(cfg).run(bindings).await,
        }
    }
}
