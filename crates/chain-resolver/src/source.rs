//! Where the current chain id comes from.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ChainResolutionError, Result};

/// Reports the numeric id of the chain a network is connected to.
#[async_trait]
pub trait ChainIdSource: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;
}

/// A chain id known ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChainId(pub u64);

#[async_trait]
impl ChainIdSource for FixedChainId {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.0)
    }
}

/// Asks a node for `eth_chainId` over JSON-RPC.
pub struct JsonRpcChainIdSource {
    url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl JsonRpcChainIdSource {
    pub fn new(url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("chain-resolver/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(JsonRpcChainIdSource {
            url: url.to_string(),
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChainIdSource for JsonRpcChainIdSource {
    async fn chain_id(&self) -> Result<u64> {
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": []});
        debug!(url = %self.url, "requesting eth_chainId");

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let reply: RpcResponse = response.json().await?;

        if let Some(err) = reply.error {
            return Err(ChainResolutionError::Rpc {
                url: self.url.clone(),
                reason: format!("{} (code {})", err.message, err.code),
            });
        }
        let result = reply
            .result
            .ok_or_else(|| ChainResolutionError::InvalidChainId("missing result".to_string()))?;
        parse_hex_quantity(&result)
    }
}

/// Parse a JSON-RPC quantity such as `0x7a69`.
pub fn parse_hex_quantity(value: &str) -> Result<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ChainResolutionError::InvalidChainId(value.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| ChainResolutionError::InvalidChainId(value.to_string()))
}
