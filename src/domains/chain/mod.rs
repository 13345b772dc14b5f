//! Aptos chain access.
//!
//! Everything the adapters need from the chain is a `view` function call or
//! an account resource read; both sit behind [`ChainClient`].

mod error;
mod rest;

use async_trait::async_trait;
use serde_json::Value;

pub use error::ChainError;
pub use rest::AptosRestClient;

/// Octas per APT.
pub const OCTAS_PER_APT: f64 = 100_000_000.0;

/// Fixed-point scale of the vault share price.
pub const SHARE_PRICE_SCALE: f64 = 1_000_000_000_000_000_000.0;

/// Native coin type.
pub const APTOS_COIN: &str = "0x1::aptos_coin::AptosCoin";

/// Read-only access to an Aptos fullnode.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Call a Move `view` function; returns the value array.
    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Vec<Value>, ChainError>;

    /// Read the `data` of an account resource.
    async fn account_resource(&self, account: &str, resource_type: &str) -> Result<Value, ChainError>;
}

/// Fully-qualified name of a function in the vault module.
pub fn vault_function(vault_address: &str, function: &str) -> String {
    format!("{vault_address}::hyperfill_vault::{function}")
}

/// Read an integer that Move serializes as a decimal string.
pub fn as_u128(value: &Value) -> Option<u128> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    }
}

/// First element of a view result as an integer.
pub fn first_u128(values: &[Value]) -> Result<u128, ChainError> {
    values
        .first()
        .and_then(as_u128)
        .ok_or_else(|| ChainError::invalid_response(format!("expected an integer, got {values:?}")))
}

/// First element of a view result as a bool.
pub fn first_bool(values: &[Value]) -> Result<bool, ChainError> {
    values
        .first()
        .and_then(Value::as_bool)
        .ok_or_else(|| ChainError::invalid_response(format!("expected a bool, got {values:?}")))
}

/// Convert an APT amount to octas as a decimal string.
///
/// Returns `None` for non-finite or non-positive amounts.
pub fn to_octas(amount: f64) -> Option<String> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let octas = (amount * OCTAS_PER_APT).round();
    if octas < 1.0 || octas > u64::MAX as f64 {
        return None;
    }
    Some(format!("{}", octas as u64))
}
