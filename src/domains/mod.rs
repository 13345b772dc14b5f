//! Domains module containing the business logic behind each logical server.
//!
//! `tools` is the MCP-facing layer; the other subdomains are the backend
//! adapters it routes to and the external collaborators they call.

pub mod chain;
pub mod decision;
pub mod market;
pub mod tools;
pub mod trading;
pub mod vault;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use chain::{AptosRestClient, ChainClient};
use decision::{CompletionClient, DecisionEngine, GroqClient};
use market::{CoinGeckoFeed, MarketClient, MarketManager, PriceFeed};
use tools::AdapterError;
use trading::AptosTrader;
use vault::VaultAnalytics;

/// Await an outbound call for at most `limit`; a timeout is an external failure.
pub async fn bounded<T, E, F>(limit: Duration, fut: F) -> std::result::Result<T, AdapterError>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<AdapterError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(AdapterError::external(format!(
            "request timed out after {limit:?}"
        ))),
    }
}

/// Adapters shared by the logical servers of one process.
///
/// The executive and pricer servers share `trader`, so they see the same
/// portfolio cache.
#[derive(Clone)]
pub struct Backends {
    pub trader: Arc<AptosTrader>,
    pub markets: Arc<MarketManager>,
    pub decision: Arc<DecisionEngine>,
    pub vault: Arc<VaultAnalytics>,
}

impl Backends {
    /// Wire the adapters to explicit collaborators.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        feed: Arc<dyn PriceFeed>,
        completion: Arc<dyn CompletionClient>,
        config: &Config,
    ) -> Self {
        let timeout = config.network.external_timeout();
        Self {
            trader: Arc::new(AptosTrader::new(chain.clone(), &config.chain, timeout)),
            markets: Arc::new(MarketManager::new(MarketClient::new(feed.clone(), timeout))),
            decision: Arc::new(DecisionEngine::new(
                completion,
                config.decision.clone(),
                timeout,
            )),
            vault: Arc::new(VaultAnalytics::new(
                chain,
                feed,
                config.chain.stats_vault_address.clone(),
                timeout,
            )),
        }
    }

    /// Wire the adapters to the live Aptos node, CoinGecko and Groq.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.network.external_timeout();

        let chain = AptosRestClient::new(&config.chain.node_url, timeout)
            .map_err(|e| Error::config(format!("Aptos client: {e}")))?;
        let feed = CoinGeckoFeed::new(&config.market.price_feed_url, timeout)
            .map_err(|e| Error::config(format!("price feed client: {e}")))?;
        let completion = GroqClient::new(
            config.credentials.groq_api_key.clone(),
            &config.decision.base_url,
            timeout,
        )
        .map_err(|e| Error::config(format!("completion client: {e}")))?;

        if !completion.has_api_key() {
            info!("GROQ_API_KEY not set; decision tools will return fallback documents");
        }
        if config.chain.account.is_none() {
            info!("HYPERFILL_ACCOUNT not set; account-bound trading calls will report failures");
        }

        Ok(Self::new(
            Arc::new(chain),
            Arc::new(feed),
            Arc::new(completion),
            config,
        ))
    }
}
