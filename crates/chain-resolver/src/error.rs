//! Error types for chain resolution.

use thiserror::Error;

/// Errors that can occur while resolving the current chain.
#[derive(Error, Debug)]
pub enum ChainResolutionError {
    /// No custom or builtin chain has the observed id.
    #[error("no chain configuration found for chain id {chain_id}; declare it as a custom chain")]
    ChainNotFound { chain_id: u64 },

    /// The local development network needs an explicit custom chain.
    #[error("network `{network}` is the local development network and has no verification endpoint; declare a custom chain for it")]
    LocalNetworkUnsupported { network: String },

    /// The JSON-RPC round trip failed.
    #[error("chain id request to {url} failed: {reason}")]
    Rpc { url: String, reason: String },

    /// The node answered with something that is not a chain id.
    #[error("invalid chain id in response: {0}")]
    InvalidChainId(String),
}

impl From<reqwest::Error> for ChainResolutionError {
    fn from(err: reqwest::Error) -> Self {
        ChainResolutionError::Rpc {
            url: err
                .url()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<unknown>".to_string()),
            reason: err.to_string(),
        }
    }
}

/// Result type for chain resolution.
pub type Result<T> = std::result::Result<T, ChainResolutionError>;
