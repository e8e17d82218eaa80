//! Well-known USDC deployments on supported EVM networks.
//!
//! These supply default asset addresses and the pinned EIP-712 domain
//! strings for each deployment. Domain strings are fixed per deployed token
//! instance and must never be inferred at runtime.

use alloy_primitives::{Address, address};

/// Base Mainnet chain id.
pub const BASE_MAINNET: u64 = 8453;

/// Base Sepolia (testnet) chain id.
pub const BASE_SEPOLIA: u64 = 84532;

/// Ethereum Mainnet chain id.
pub const ETHEREUM_MAINNET: u64 = 1;

/// Polygon Mainnet chain id.
pub const POLYGON_MAINNET: u64 = 137;

/// USDC contract address on Base Mainnet.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// USDC contract address on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

/// USDC contract address on Ethereum Mainnet.
pub const USDC_ETHEREUM: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// USDC contract address on Polygon Mainnet.
pub const USDC_POLYGON: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// EIP-712 domain `name` of mainnet USDC deployments.
pub const USDC_NAME: &str = "USD Coin";

/// EIP-712 domain `name` of the Base Sepolia USDC deployment.
pub const USDC_NAME_SEPOLIA: &str = "USDC";

/// EIP-712 domain `version` shared by current USDC deployments.
pub const USDC_VERSION: &str = "2";

/// A known stablecoin deployment.
#[derive(Debug, Clone)]
pub struct UsdcDeployment {
    /// Network name used in payment headers.
    pub network: &'static str,
    /// Numeric EVM chain id.
    pub chain_id: u64,
    /// Token contract address.
    pub address: Address,
    /// Pinned EIP-712 domain `name`.
    pub name: &'static str,
    /// Pinned EIP-712 domain `version`.
    pub version: &'static str,
}

/// Returns all known USDC deployments.
#[must_use]
pub fn known_deployments() -> Vec<UsdcDeployment> {
    vec![
        UsdcDeployment {
            network: "base",
            chain_id: BASE_MAINNET,
            address: USDC_BASE,
            name: USDC_NAME,
            version: USDC_VERSION,
        },
        UsdcDeployment {
            network: "base-sepolia",
            chain_id: BASE_SEPOLIA,
            address: USDC_BASE_SEPOLIA,
            name: USDC_NAME_SEPOLIA,
            version: USDC_VERSION,
        },
        UsdcDeployment {
            network: "ethereum",
            chain_id: ETHEREUM_MAINNET,
            address: USDC_ETHEREUM,
            name: USDC_NAME,
            version: USDC_VERSION,
        },
        UsdcDeployment {
            network: "polygon",
            chain_id: POLYGON_MAINNET,
            address: USDC_POLYGON,
            name: USDC_NAME,
            version: USDC_VERSION,
        },
    ]
}

/// Looks up a known deployment by network name.
#[must_use]
pub fn deployment_by_network(network: &str) -> Option<UsdcDeployment> {
    known_deployments().into_iter().find(|d| d.network == network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_lookup() {
        let base = deployment_by_network("base").unwrap();
        assert_eq!(base.chain_id, BASE_MAINNET);
        assert_eq!(base.address, USDC_BASE);
        assert_eq!(base.name, "USD Coin");

        let sepolia = deployment_by_network("base-sepolia").unwrap();
        assert_eq!(sepolia.name, "USDC");
        assert!(deployment_by_network("unknown").is_none());
    }
}
