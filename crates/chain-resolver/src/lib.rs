//! Chain resolution for contract verification.
//!
//! Maps the chain id a network reports to the block explorer endpoints
//! used to verify contracts compiled there. Custom chain declarations take
//! precedence over the builtin table, later declarations over earlier ones.

pub mod chains;
pub mod error;
pub mod resolve;
pub mod source;

pub use chains::{builtin_chains, ChainConfig, ExplorerUrls, LOCAL_NETWORK_NAME};
pub use error::{ChainResolutionError, Result};
pub use resolve::{find_chain, resolve_chain};
pub use source::{parse_hex_quantity, ChainIdSource, FixedChainId, JsonRpcChainIdSource};
