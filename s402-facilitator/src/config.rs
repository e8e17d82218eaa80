//! Facilitator server configuration.
//!
//! Loads a TOML file with support for environment-variable expansion in
//! string values (`$VAR` or `${VAR}` syntax), so secrets like relay keys
//! stay out of the file itself.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4021
//! clock_skew_tolerance = 30
//!
//! [fees]
//! basis_points = 25
//! min_fee = "100"
//! max_fee = "50000"
//! recipient = "0x..."
//!
//! [chains."base-sepolia"]
//! rpc_url = "https://sepolia.base.org"
//! upstream_url = "https://x402.org/facilitator"
//! relay_private_key = "$RELAY_KEY_BASE_SEPOLIA"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to the configuration file (default: `config.toml`)
//! - `HOST` / `PORT` — Override the bind address
//! - Relay keys and other secrets referenced by `$VAR` in the file

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use alloy_primitives::Address;
use s402::chain::ChainSettings;
use s402::networks;
use s402::units::TokenAmount;
use s402_evm::fees::FeeSchedule;
use serde::{Deserialize, Serialize};

/// Top-level facilitator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4021`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Clock-skew grace in seconds for validity-window checks
    /// (default: `30`).
    #[serde(default = "default_clock_skew")]
    pub clock_skew_tolerance: u64,

    /// Fee schedule for future fee collection.
    #[serde(default)]
    pub fees: FeeConfig,

    /// Chain configurations keyed by network name.
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

/// Fee configuration: a basis-point rate with clamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Fee rate in basis points; zero disables fees.
    #[serde(default)]
    pub basis_points: u32,
    /// Minimum fee in the asset's smallest unit.
    #[serde(default)]
    pub min_fee: TokenAmount,
    /// Maximum fee in the asset's smallest unit; zero means uncapped.
    #[serde(default)]
    pub max_fee: TokenAmount,
    /// Address collected fees would be sent to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl FeeConfig {
    /// Builds the engine's fee schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if `recipient` is present but not a valid address.
    pub fn to_schedule(&self) -> Result<FeeSchedule, Box<dyn std::error::Error>> {
        let recipient = match &self.recipient {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<Address>()
                    .map_err(|e| format!("invalid fee recipient {raw}: {e}"))?,
            ),
            _ => None,
        };
        Ok(FeeSchedule {
            basis_points: self.basis_points,
            min_fee: self.min_fee.into(),
            max_fee: self.max_fee.into(),
            recipient,
        })
    }
}

/// Per-chain configuration.
///
/// Fields left out fall back to the known USDC deployment for the network
/// name, so a testnet entry can be as small as an `rpc_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Numeric chain id; defaults from the known-network table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    /// Asset (stablecoin) contract address; defaults from the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    /// Pinned EIP-712 domain `name` of the asset deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,

    /// Pinned EIP-712 domain `version` of the asset deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_version: Option<String>,

    /// Upstream facilitator base URL for the EOA forwarding branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,

    /// Relay private key (hex, `$VAR` expansion supported). Absent key
    /// puts the chain in forwarding-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_private_key: Option<String>,
}

impl ChainConfig {
    /// Resolves this entry into engine [`ChainSettings`], filling gaps from
    /// the known-deployment table.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is neither configured nor
    /// derivable, or if an address or URL fails to parse.
    pub fn resolve(&self, network: &str) -> Result<ChainSettings, Box<dyn std::error::Error>> {
        let known = networks::deployment_by_network(network);

        let chain_id = self
            .chain_id
            .or_else(|| known.as_ref().map(|d| d.chain_id))
            .ok_or_else(|| format!("chain_id not configured for unknown network {network}"))?;

        let asset = match &self.asset {
            Some(raw) => raw
                .parse::<Address>()
                .map_err(|e| format!("invalid asset address for {network}: {e}"))?,
            None => {
                known
                    .as_ref()
                    .map(|d| d.address)
                    .ok_or_else(|| format!("asset not configured for unknown network {network}"))?
            }
        };

        let asset_name = self
            .asset_name
            .clone()
            .or_else(|| known.as_ref().map(|d| d.name.to_owned()))
            .ok_or_else(|| format!("asset_name not configured for unknown network {network}"))?;

        let asset_version = self
            .asset_version
            .clone()
            .or_else(|| known.as_ref().map(|d| d.version.to_owned()))
            .ok_or_else(|| format!("asset_version not configured for {network}"))?;

        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| format!("invalid rpc_url for {network}: {e}"))?;

        let upstream_url = match &self.upstream_url {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.parse()
                    .map_err(|e| format!("invalid upstream_url for {network}: {e}"))?,
            ),
            _ => None,
        };

        Ok(ChainSettings {
            network: network.to_owned(),
            chain_id,
            rpc_url,
            asset,
            asset_name,
            asset_version,
            upstream_url,
        })
    }

    /// The relay key, if present and actually resolved (an unexpanded
    /// `$VAR` placeholder counts as absent).
    #[must_use]
    pub fn resolved_relay_key(&self) -> Option<&str> {
        let key = self.relay_private_key.as_deref()?.trim();
        if key.is_empty() || key.starts_with('$') {
            None
        } else {
            Some(key)
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    4021
}

fn default_clock_skew() -> u64 {
    30
}

impl FacilitatorConfig {
    /// Loads configuration from the path in the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    /// `HOST` and `PORT` env vars override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path. A missing file yields
    /// the defaults (no chains configured).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let expanded = expand_env_vars(&content);
        let mut config: Self = toml::from_str(&expanded)?;

        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` references from the process environment.
/// Unresolved references are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            let part_of_name = if braced {
                c != '}'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !part_of_name {
                break;
            }
            name.push(c);
            chars.next();
        }
        if braced && chars.peek() == Some(&'}') {
            chars.next();
        }

        match std::env::var(&name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => {
                out.push('$');
                if braced {
                    out.push('{');
                }
                out.push_str(&name);
                if braced {
                    out.push('}');
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        // Safety note: tests in this module do not run concurrently with
        // anything else reading these variables.
        unsafe {
            std::env::set_var("S402_TEST_KEY", "0xsecret");
        }
        assert_eq!(expand_env_vars("key = \"$S402_TEST_KEY\""), "key = \"0xsecret\"");
        assert_eq!(
            expand_env_vars("key = \"${S402_TEST_KEY}\""),
            "key = \"0xsecret\""
        );
        assert_eq!(
            expand_env_vars("key = \"$S402_TEST_MISSING\""),
            "key = \"$S402_TEST_MISSING\""
        );
        assert_eq!(expand_env_vars("just text"), "just text");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: FacilitatorConfig = toml::from_str(
            r#"
            [chains."base-sepolia"]
            rpc_url = "https://sepolia.base.org"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 4021);
        assert_eq!(config.clock_skew_tolerance, 30);

        let chain = &config.chains["base-sepolia"];
        let settings = chain.resolve("base-sepolia").unwrap();
        assert_eq!(settings.chain_id, 84532);
        assert_eq!(settings.asset_name, "USDC");
        assert!(settings.upstream_url.is_none());
        assert!(chain.resolved_relay_key().is_none());
    }

    #[test]
    fn test_unknown_network_requires_explicit_fields() {
        let chain = ChainConfig {
            rpc_url: "https://rpc.example.org".to_owned(),
            chain_id: None,
            asset: None,
            asset_name: None,
            asset_version: None,
            upstream_url: None,
            relay_private_key: None,
        };
        assert!(chain.resolve("examplenet").is_err());

        let chain = ChainConfig {
            chain_id: Some(4242),
            asset: Some("0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_owned()),
            asset_name: Some("USDC".to_owned()),
            asset_version: Some("2".to_owned()),
            ..chain
        };
        let settings = chain.resolve("examplenet").unwrap();
        assert_eq!(settings.chain_id, 4242);
    }

    #[test]
    fn test_unexpanded_relay_key_counts_as_absent() {
        let chain = ChainConfig {
            rpc_url: "https://sepolia.base.org".to_owned(),
            chain_id: None,
            asset: None,
            asset_name: None,
            asset_version: None,
            upstream_url: None,
            relay_private_key: Some("$MISSING_RELAY_KEY".to_owned()),
        };
        assert!(chain.resolved_relay_key().is_none());
    }

    #[test]
    fn test_fee_config_to_schedule() {
        let fees = FeeConfig {
            basis_points: 25,
            min_fee: TokenAmount::from_units(100),
            max_fee: TokenAmount::from_units(50_000),
            recipient: Some("0x2222222222222222222222222222222222222222".to_owned()),
        };
        let schedule = fees.to_schedule().unwrap();
        assert_eq!(schedule.basis_points, 25);
        assert!(schedule.recipient.is_some());

        let bad = FeeConfig {
            recipient: Some("not-an-address".to_owned()),
            ..FeeConfig::default()
        };
        assert!(bad.to_schedule().is_err());
    }
}
