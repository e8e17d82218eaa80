//! Verification preconditions and the on-chain signature-check boundary.
//!
//! The precondition asserts are pure; the one piece of chain I/O — asking
//! the payer's smart account whether it accepts a signature for a hash —
//! sits behind the narrow [`SignatureChecker`] trait so the engine is
//! testable with a fake implementation.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256};
use alloy_provider::Provider;
use alloy_transport::TransportError;
use s402::FacilitatorError;
use s402::units::UnixTimestamp;

use super::contract::IERC1271;

/// Rejects an authorized value below the required amount.
///
/// # Errors
///
/// Returns [`FacilitatorError::AmountOrRecipientMismatch`] when
/// `authorized < required`.
pub fn assert_enough_value(authorized: U256, required: U256) -> Result<(), FacilitatorError> {
    if authorized < required {
        return Err(FacilitatorError::AmountOrRecipientMismatch(format!(
            "authorized value {authorized} is below the required amount {required}"
        )));
    }
    Ok(())
}

/// Rejects a recipient that differs from the expected one.
///
/// Addresses are compared as parsed values, so the check is independent of
/// hex casing.
///
/// # Errors
///
/// Returns [`FacilitatorError::AmountOrRecipientMismatch`] on mismatch.
pub fn assert_recipient(to: Address, expected: Address) -> Result<(), FacilitatorError> {
    if to != expected {
        return Err(FacilitatorError::AmountOrRecipientMismatch(format!(
            "recipient {to} does not match expected {expected}"
        )));
    }
    Ok(())
}

/// Rejects an authorization drawn against a different asset than the chain
/// settles in.
///
/// # Errors
///
/// Returns [`FacilitatorError::AmountOrRecipientMismatch`] on mismatch.
pub fn assert_asset(asset: Address, expected: Address) -> Result<(), FacilitatorError> {
    if asset != expected {
        return Err(FacilitatorError::AmountOrRecipientMismatch(format!(
            "asset {asset} does not match the configured asset {expected}"
        )));
    }
    Ok(())
}

/// Validates that the current time falls within the authorization window.
///
/// `skew` is a grace buffer in seconds: expiry must lie at least `skew`
/// seconds in the future to leave room for settlement latency and clock
/// drift between this host and the chain.
///
/// # Errors
///
/// Returns [`FacilitatorError::WindowExpired`] or
/// [`FacilitatorError::WindowNotStarted`].
pub fn assert_time(
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
    skew: u64,
) -> Result<(), FacilitatorError> {
    let now = UnixTimestamp::now();
    if valid_before < now + skew {
        return Err(FacilitatorError::WindowExpired);
    }
    if valid_after > now {
        return Err(FacilitatorError::WindowNotStarted);
    }
    Ok(())
}

/// Validates the replay nonce shape: a non-empty 32-byte value.
///
/// # Errors
///
/// Returns [`FacilitatorError::MalformedHeader`] for an empty or
/// wrongly-sized nonce.
pub fn assert_nonce(nonce: &Bytes) -> Result<B256, FacilitatorError> {
    if nonce.is_empty() {
        return Err(FacilitatorError::MalformedHeader(
            "authorization nonce is empty".to_owned(),
        ));
    }
    if nonce.len() != 32 {
        return Err(FacilitatorError::MalformedHeader(format!(
            "authorization nonce must be 32 bytes, got {}",
            nonce.len()
        )));
    }
    Ok(B256::from_slice(nonce))
}

/// Errors from asking an account whether it accepts a signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureCheckError {
    /// The RPC endpoint could not be reached or failed at the transport
    /// level; verification cannot conclude either way.
    #[error("rpc transport: {0}")]
    Transport(String),
    /// The account reverted or the call could not be decoded; the
    /// signature is not acceptable and the raw reason is surfaced.
    #[error("{0}")]
    Rejected(String),
}

/// The delegation contract's signature validation, seen through a keyhole.
///
/// `check_signature` returns the 4-byte value `isValidSignature(hash,
/// signature)` produced on `account`. The engine treats exactly
/// [`super::signature::ERC1271_MAGIC`] as success; any other value, and any
/// revert, is failure. The contract's internal session-permission
/// bookkeeping is never reimplemented here.
pub trait SignatureChecker: Send + Sync {
    /// Calls `isValidSignature(hash, signature)` on `account`.
    fn check_signature(
        &self,
        account: Address,
        hash: B256,
        signature: Bytes,
    ) -> impl Future<Output = Result<FixedBytes<4>, SignatureCheckError>> + Send;
}

/// [`SignatureChecker`] backed by a read-only `eth_call` through an alloy
/// provider.
#[derive(Debug)]
pub struct RpcSignatureChecker<P> {
    provider: P,
}

impl<P> RpcSignatureChecker<P> {
    /// Wraps a provider for the target chain.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: Provider> SignatureChecker for RpcSignatureChecker<P> {
    async fn check_signature(
        &self,
        account: Address,
        hash: B256,
        signature: Bytes,
    ) -> Result<FixedBytes<4>, SignatureCheckError> {
        let account_contract = IERC1271::new(account, &self.provider);
        match account_contract.isValidSignature(hash, signature).call().await {
            Ok(magic) => Ok(magic),
            Err(alloy_contract::Error::TransportError(TransportError::ErrorResp(payload))) => {
                // A revert arrives as a JSON-RPC error response; everything
                // in it is the failure detail the caller wants to see.
                Err(SignatureCheckError::Rejected(payload.to_string()))
            }
            Err(alloy_contract::Error::TransportError(e)) => {
                Err(SignatureCheckError::Transport(e.to_string()))
            }
            Err(e) => Err(SignatureCheckError::Rejected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_enough_value() {
        assert!(assert_enough_value(U256::from(100u64), U256::from(100u64)).is_ok());
        assert!(assert_enough_value(U256::from(101u64), U256::from(100u64)).is_ok());
        assert!(matches!(
            assert_enough_value(U256::from(99u64), U256::from(100u64)),
            Err(FacilitatorError::AmountOrRecipientMismatch(_))
        ));
    }

    #[test]
    fn test_assert_time_window() {
        let now = UnixTimestamp::now();
        assert!(assert_time(UnixTimestamp::from_secs(0), now + 3_600, 30).is_ok());
        assert!(matches!(
            assert_time(UnixTimestamp::from_secs(0), UnixTimestamp::from_secs(1), 30),
            Err(FacilitatorError::WindowExpired)
        ));
        assert!(matches!(
            assert_time(now + 3_600, now + 7_200, 30),
            Err(FacilitatorError::WindowNotStarted)
        ));
    }

    #[test]
    fn test_assert_time_skew_buffer() {
        let now = UnixTimestamp::now();
        // Expires in 10 seconds: fine with no skew, rejected with 30.
        assert!(assert_time(UnixTimestamp::from_secs(0), now + 10, 0).is_ok());
        assert!(matches!(
            assert_time(UnixTimestamp::from_secs(0), now + 10, 30),
            Err(FacilitatorError::WindowExpired)
        ));
    }

    #[test]
    fn test_assert_nonce_shape() {
        assert!(matches!(
            assert_nonce(&Bytes::new()),
            Err(FacilitatorError::MalformedHeader(_))
        ));
        assert!(matches!(
            assert_nonce(&Bytes::from(vec![1u8; 16])),
            Err(FacilitatorError::MalformedHeader(_))
        ));
        let nonce = assert_nonce(&Bytes::from(vec![5u8; 32])).unwrap();
        assert_eq!(nonce, B256::repeat_byte(5));
    }
}
