//! Per-chain settings and the chain registry.
//!
//! [`ChainSettings`] is everything the engine needs to know about one
//! network: where to reach it, which stablecoin it settles in, the pinned
//! EIP-712 domain strings of that token deployment, and (optionally) an
//! upstream facilitator to forward EOA payments to.
//!
//! The registry is a pure lookup table. It is built once at startup from
//! configuration and never mutated afterwards; there is no hot-reload path.

use std::collections::HashMap;

use alloy_primitives::Address;
use url::Url;

/// Static configuration for one supported network.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Network name used in payment headers (e.g. `"base-sepolia"`).
    pub network: String,
    /// Numeric EVM chain id (e.g. `84532`).
    pub chain_id: u64,
    /// HTTP RPC endpoint.
    pub rpc_url: Url,
    /// The stablecoin contract settlements are drawn against.
    pub asset: Address,
    /// EIP-712 domain `name` of the asset deployment. Protocol-fixed per
    /// deployed token instance; configured, never fetched or inferred.
    pub asset_name: String,
    /// EIP-712 domain `version` of the asset deployment.
    pub asset_version: String,
    /// Upstream facilitator base URL, if EOA payments on this chain should
    /// be forwarded rather than verified locally.
    pub upstream_url: Option<Url>,
}

/// Registry of configured chains, keyed by network name.
#[derive(Debug, Default)]
pub struct ChainRegistry(HashMap<String, ChainSettings>);

impl ChainRegistry {
    /// Builds a registry from a list of settings. Later duplicates of the
    /// same network name replace earlier ones.
    #[must_use]
    pub fn new(chains: impl IntoIterator<Item = ChainSettings>) -> Self {
        Self(
            chains
                .into_iter()
                .map(|settings| (settings.network.clone(), settings))
                .collect(),
        )
    }

    /// Looks up the settings for a network name.
    #[must_use]
    pub fn get(&self, network: &str) -> Option<&ChainSettings> {
        self.0.get(network)
    }

    /// Iterates over all configured chains.
    pub fn iter(&self) -> impl Iterator<Item = &ChainSettings> {
        self.0.values()
    }

    /// Number of configured chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no chains are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    fn settings(network: &str) -> ChainSettings {
        ChainSettings {
            network: network.to_owned(),
            chain_id: 84532,
            rpc_url: "https://sepolia.base.org".parse().unwrap(),
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            asset_name: "USDC".to_owned(),
            asset_version: "2".to_owned(),
            upstream_url: None,
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ChainRegistry::new([settings("base-sepolia"), settings("base")]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("base-sepolia").is_some());
        assert!(registry.get("optimism").is_none());
    }

    #[test]
    fn test_registry_is_pure_lookup() {
        let registry = ChainRegistry::new([settings("base")]);
        let first = registry.get("base").unwrap().chain_id;
        let second = registry.get("base").unwrap().chain_id;
        assert_eq!(first, second);
    }
}
