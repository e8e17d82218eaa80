//! Protocol-exact EIP-712 hashing.
//!
//! Two struct shapes are signed in this system:
//!
//! - [`TransferWithAuthorization`], the EIP-3009 value-transfer
//!   authorization, bound to the asset's own domain. The domain
//!   `name`/`version` are fixed per deployed token instance and come from
//!   chain configuration — they are never fetched or inferred.
//! - [`SessionSignature`], the wrapper a session key countersigns. Its
//!   domain uses the payer's own smart-account address as
//!   `verifyingContract` and the delegation contract's fixed name/version,
//!   which lets the session key commit to a specific domain/struct-hash
//!   pair without knowing the asset domain strings at signing time; the
//!   delegation contract revalidates the preimage on-chain.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use s402::proto::ExactPayload;

/// EIP-712 domain `name` fixed by the deployed delegation contract.
pub const SESSION_DOMAIN_NAME: &str = "SessionKeyAccount";

/// EIP-712 domain `version` fixed by the deployed delegation contract.
pub const SESSION_DOMAIN_VERSION: &str = "1";

sol!(
    /// EIP-3009 `TransferWithAuthorization` typed-data struct.
    ///
    /// Field order matches the canonical type string; changing it changes
    /// every signing hash.
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

sol!(
    /// The session-signature wrapper struct countersigned by a session key.
    #[derive(Debug)]
    struct SessionSignature {
        address verifyingContract;
        bytes32 structHash;
    }
);

/// Constructs the EIP-712 domain of an asset deployment.
#[must_use]
pub fn asset_domain(name: &str, version: &str, chain_id: u64, asset: Address) -> Eip712Domain {
    eip712_domain! {
        name: name.to_owned(),
        version: version.to_owned(),
        chain_id: chain_id,
        verifying_contract: asset,
    }
}

/// Constructs the session-wrapper domain for a payer's smart account.
#[must_use]
pub fn session_domain(chain_id: u64, account: Address) -> Eip712Domain {
    eip712_domain! {
        name: SESSION_DOMAIN_NAME,
        version: SESSION_DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: account,
    }
}

/// Computes the 32-byte EIP-712 signing hash of a transfer authorization.
///
/// Deterministic: identical payload, nonce, and domain always produce a
/// byte-identical digest.
#[must_use]
pub fn transfer_authorization_hash(
    payload: &ExactPayload,
    nonce: B256,
    domain: &Eip712Domain,
) -> B256 {
    let message = TransferWithAuthorization {
        from: payload.from,
        to: payload.to,
        value: payload.value.into(),
        validAfter: U256::from(payload.valid_after.as_secs()),
        validBefore: U256::from(payload.valid_before.as_secs()),
        nonce,
    };
    message.eip712_signing_hash(domain)
}

/// Computes the EIP-712 signing hash a session key must have countersigned
/// for the given domain/struct-hash pair.
#[must_use]
pub fn session_wrapper_hash(
    verifying_contract: Address,
    struct_hash: B256,
    account: Address,
    chain_id: u64,
) -> B256 {
    let message = SessionSignature {
        verifyingContract: verifying_contract,
        structHash: struct_hash,
    };
    message.eip712_signing_hash(&session_domain(chain_id, account))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Bytes, address};
    use s402::units::{TokenAmount, UnixTimestamp};

    use super::*;

    fn payload() -> ExactPayload {
        ExactPayload {
            from: address!("1111111111111111111111111111111111111111"),
            to: address!("2222222222222222222222222222222222222222"),
            value: TokenAmount::from_units(1_000_000),
            valid_after: UnixTimestamp::from_secs(0),
            valid_before: UnixTimestamp::from_secs(1_800_000_000),
            nonce: Bytes::from(vec![9u8; 32]),
            signature: Bytes::new(),
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
        }
    }

    #[test]
    fn test_transfer_hash_is_deterministic() {
        let p = payload();
        let domain = asset_domain("USDC", "2", 84532, p.asset);
        let first = transfer_authorization_hash(&p, B256::repeat_byte(9), &domain);
        let second = transfer_authorization_hash(&p, B256::repeat_byte(9), &domain);
        assert_eq!(first, second);
    }

    #[test]
    fn test_transfer_hash_depends_on_every_field() {
        let p = payload();
        let domain = asset_domain("USDC", "2", 84532, p.asset);
        let base = transfer_authorization_hash(&p, B256::repeat_byte(9), &domain);

        let other_nonce = transfer_authorization_hash(&p, B256::repeat_byte(8), &domain);
        assert_ne!(base, other_nonce);

        let mut bumped = payload();
        bumped.value = TokenAmount::from_units(1_000_001);
        assert_ne!(
            base,
            transfer_authorization_hash(&bumped, B256::repeat_byte(9), &domain)
        );

        let other_chain = asset_domain("USDC", "2", 8453, p.asset);
        assert_ne!(
            base,
            transfer_authorization_hash(&p, B256::repeat_byte(9), &other_chain)
        );
    }

    #[test]
    fn test_session_wrapper_hash_binds_to_account() {
        let contract = address!("3333333333333333333333333333333333333333");
        let struct_hash = B256::repeat_byte(5);
        let account_a = address!("4444444444444444444444444444444444444444");
        let account_b = address!("5555555555555555555555555555555555555555");

        let a = session_wrapper_hash(contract, struct_hash, account_a, 84532);
        let a_again = session_wrapper_hash(contract, struct_hash, account_a, 84532);
        let b = session_wrapper_hash(contract, struct_hash, account_b, 84532);

        assert_eq!(a, a_again);
        assert_ne!(a, b);
    }
}
