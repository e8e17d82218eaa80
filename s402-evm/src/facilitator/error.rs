//! Engine-local error type and its mapping onto the facilitator taxonomy.

use alloy_primitives::TxHash;
use s402::FacilitatorError;

use super::verify::SignatureCheckError;
use crate::provider::RelaySendError;

/// Errors raised inside the EVM engine before they are mapped onto the
/// protocol-level [`FacilitatorError`] taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum EvmFacilitatorError {
    /// Relay submission failed.
    #[error(transparent)]
    Relay(#[from] RelaySendError),
    /// The settlement transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    TransactionReverted(TxHash),
    /// The on-chain signature check failed.
    #[error(transparent)]
    Check(#[from] SignatureCheckError),
    /// An already-classified protocol failure.
    #[error(transparent)]
    Payment(#[from] FacilitatorError),
}

impl From<EvmFacilitatorError> for FacilitatorError {
    fn from(value: EvmFacilitatorError) -> Self {
        match value {
            EvmFacilitatorError::Relay(RelaySendError::Transport(e)) => {
                Self::UpstreamUnavailable(e.to_string())
            }
            EvmFacilitatorError::Relay(RelaySendError::PendingTransaction(e)) => {
                Self::UpstreamUnavailable(e.to_string())
            }
            EvmFacilitatorError::Relay(RelaySendError::Custom(e)) => Self::SettlementUnsubmitted(e),
            EvmFacilitatorError::TransactionReverted(hash) => {
                Self::SettlementReverted(hash.to_string())
            }
            EvmFacilitatorError::Check(SignatureCheckError::Transport(e)) => {
                Self::UpstreamUnavailable(e)
            }
            EvmFacilitatorError::Check(SignatureCheckError::Rejected(e)) => {
                Self::SignatureInvalid(e)
            }
            EvmFacilitatorError::Payment(e) => e,
        }
    }
}
