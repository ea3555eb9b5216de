//! Picking the chain configuration for the current network.

use tracing::{debug, info};

use crate::chains::{ChainConfig, LOCAL_NETWORK_NAME};
use crate::error::{ChainResolutionError, Result};
use crate::source::ChainIdSource;

/// Find the configuration for `chain_id` without any network access.
///
/// Custom chains are searched last-first, so a later declaration overrides
/// an earlier one, and all of them override `builtin`.
pub fn find_chain<'a>(
    network_name: &str,
    chain_id: u64,
    custom: &'a [ChainConfig],
    builtin: &'a [ChainConfig],
) -> Result<&'a ChainConfig> {
    let found = custom
        .iter()
        .rev()
        .chain(builtin.iter())
        .find(|chain| chain.chain_id == chain_id);

    match found {
        Some(chain) => {
            debug!(network = %network_name, chain_id, resolved = %chain.network, "chain resolved");
            Ok(chain)
        }
        None if network_name == LOCAL_NETWORK_NAME => {
            Err(ChainResolutionError::LocalNetworkUnsupported {
                network: network_name.to_string(),
            })
        }
        None => Err(ChainResolutionError::ChainNotFound { chain_id }),
    }
}

/// Ask `source` for the chain id and resolve it against `custom` then `builtin`.
pub async fn resolve_chain(
    network_name: &str,
    source: &dyn ChainIdSource,
    custom: &[ChainConfig],
    builtin: &[ChainConfig],
) -> Result<ChainConfig> {
    let chain_id = source.chain_id().await?;
    info!(network = %network_name, chain_id, "resolving chain configuration");
    find_chain(network_name, chain_id, custom, builtin).cloned()
}
