//! Vault domain: statistics and simulated actions on the HyperFill vault.

mod analytics;

pub use analytics::{
    ArbitrageOpportunity, ArbitrageReport, DEFAULT_MIN_PROFIT, TokenMarketData, VaultAction,
    VaultAnalytics, VaultStats,
};
