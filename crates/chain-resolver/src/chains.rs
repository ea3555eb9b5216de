//! Chain definitions and the builtin table.

use serde::{Deserialize, Serialize};

/// Name of the local development network.
pub const LOCAL_NETWORK_NAME: &str = "hardhat";

/// Block explorer endpoints used for contract verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerUrls {
    /// Verification API endpoint.
    pub api_url: String,
    /// Human-facing explorer root.
    pub browser_url: String,
}

/// A network and where to verify contracts deployed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub network: String,
    pub chain_id: u64,
    pub urls: ExplorerUrls,
}

impl ChainConfig {
    pub fn new(network: &str, chain_id: u64, api_url: &str, browser_url: &str) -> Self {
        ChainConfig {
            network: network.to_string(),
            chain_id,
            urls: ExplorerUrls {
                api_url: api_url.to_string(),
                browser_url: browser_url.to_string(),
            },
        }
    }
}

/// Well-known networks with public explorers.
pub fn builtin_chains() -> Vec<ChainConfig> {
    [
        ("mainnet", 1, "https://api.etherscan.io/api", "https://etherscan.io"),
        ("sepolia", 11155111, "https://api-sepolia.etherscan.io/api", "https://sepolia.etherscan.io"),
        ("holesky", 17000, "https://api-holesky.etherscan.io/api", "https://holesky.etherscan.io"),
        ("bsc", 56, "https://api.bscscan.com/api", "https://bscscan.com"),
        ("bscTestnet", 97, "https://api-testnet.bscscan.com/api", "https://testnet.bscscan.com"),
        ("optimisticEthereum", 10, "https://api-optimistic.etherscan.io/api", "https://optimistic.etherscan.io"),
        ("polygon", 137, "https://api.polygonscan.com/api", "https://polygonscan.com"),
        ("polygonAmoy", 80002, "https://api-amoy.polygonscan.com/api", "https://amoy.polygonscan.com"),
        ("arbitrumOne", 42161, "https://api.arbiscan.io/api", "https://arbiscan.io"),
        ("arbitrumSepolia", 421614, "https://api-sepolia.arbiscan.io/api", "https://sepolia.arbiscan.io"),
        ("base", 8453, "https://api.basescan.org/api", "https://basescan.org"),
        ("baseSepolia", 84532, "https://api-sepolia.basescan.org/api", "https://sepolia.basescan.org"),
        ("gnosis", 100, "https://api.gnosisscan.io/api", "https://gnosisscan.io"),
        ("linea", 59144, "https://api.lineascan.build/api", "https://lineascan.build"),
        ("moonbeam", 1284, "https://api-moonbeam.moonscan.io/api", "https://moonbeam.moonscan.io"),
    ]
    .into_iter()
    .map(|(network, id, api, browser)| ChainConfig::new(network, id, api, browser))
    .collect()
}
