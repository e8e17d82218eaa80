//! Direct on-chain settlement.
//!
//! The relay submits `transferWithAuthorization` against the asset contract
//! with a gas limit of `max(intrinsic floor, node estimate)`. The floor is
//! calldata-proportional because the execution environment enforces a
//! minimum derived from calldata size independent of EVM opcode cost; the
//! node estimate covers actual execution. One confirmation is awaited, and
//! a mined-but-reverted transaction is a settlement failure even though a
//! hash exists.

use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use alloy_sol_types::SolCall;
use s402::proto::ExactPayload;
use tracing::{info, warn};

use super::contract::IEIP3009;
use super::error::EvmFacilitatorError;
use super::signature::unwrap_eip6492;
use crate::provider::{RelayProvider, RelayTransaction};

/// Fixed per-transaction base cost in gas units.
pub const BASE_TX_GAS: u64 = 21_000;

/// Gas units charged per zero calldata byte.
pub const ZERO_BYTE_GAS: u64 = 4;

/// Gas units charged per non-zero calldata byte.
pub const NONZERO_BYTE_GAS: u64 = 16;

/// Computes the calldata-proportional gas floor for a transaction.
#[must_use]
pub fn intrinsic_gas(calldata: &[u8]) -> u64 {
    let zero_bytes = calldata.iter().filter(|byte| **byte == 0).count() as u64;
    let nonzero_bytes = calldata.len() as u64 - zero_bytes;
    BASE_TX_GAS + zero_bytes * ZERO_BYTE_GAS + nonzero_bytes * NONZERO_BYTE_GAS
}

/// Encodes the `transferWithAuthorization` call for a payment.
///
/// A wrapped signature is reduced to its inner signature first; the token
/// contract validates it against the (by then deployed) smart account.
#[must_use]
pub fn transfer_calldata(payload: &ExactPayload, nonce: B256) -> Bytes {
    let call = IEIP3009::transferWithAuthorizationCall {
        from: payload.from,
        to: payload.to,
        value: payload.value.into(),
        validAfter: U256::from(payload.valid_after.as_secs()),
        validBefore: U256::from(payload.valid_before.as_secs()),
        nonce,
        signature: unwrap_eip6492(&payload.signature),
    };
    call.abi_encode().into()
}

/// Submits the transfer directly and waits for one confirmation.
///
/// # Errors
///
/// Returns [`EvmFacilitatorError`] on relay failure or a reverted
/// transaction.
pub async fn settle_direct<R: RelayProvider>(
    relay: &R,
    asset: Address,
    payload: &ExactPayload,
    nonce: B256,
) -> Result<TxHash, EvmFacilitatorError> {
    let calldata = transfer_calldata(payload, nonce);
    let floor = intrinsic_gas(&calldata);
    let estimate = relay.estimate_gas(asset, calldata.clone()).await?;
    let gas_limit = floor.max(estimate);

    let receipt = relay
        .send_transaction(RelayTransaction {
            to: asset,
            calldata,
            gas_limit,
            confirmations: 1,
        })
        .await?;

    if receipt.success {
        info!(
            tx = %receipt.transaction_hash,
            from = %payload.from,
            to = %payload.to,
            value = %payload.value,
            gas_limit,
            "transferWithAuthorization confirmed"
        );
        Ok(receipt.transaction_hash)
    } else {
        warn!(
            tx = %receipt.transaction_hash,
            from = %payload.from,
            "transferWithAuthorization reverted"
        );
        Err(EvmFacilitatorError::TransactionReverted(
            receipt.transaction_hash,
        ))
    }
}
