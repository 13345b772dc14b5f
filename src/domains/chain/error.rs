//! Chain client errors.

use thiserror::Error;

use crate::domains::tools::AdapterError;

/// Failures talking to an Aptos fullnode.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The request never produced a response.
    #[error("Aptos request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("Aptos API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The node answered with a body we could not interpret.
    #[error("Unexpected Aptos response: {0}")]
    InvalidResponse(String),

    /// A required account address is not configured.
    #[error("No trading account configured (set HYPERFILL_ACCOUNT)")]
    MissingAccount,
}

impl ChainError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<ChainError> for AdapterError {
    fn from(err: ChainError) -> Self {
        AdapterError::external(err.to_string())
    }
}
