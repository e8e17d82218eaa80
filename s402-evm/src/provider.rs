//! The relay transaction boundary for direct settlement.
//!
//! Direct settlement submits `transferWithAuthorization` with an
//! operator-held relay key. The engine only needs two operations from the
//! chain — estimate gas and send-then-confirm — so they are modeled as the
//! narrow [`RelayProvider`] trait; tests substitute a fake, the binary wires
//! in [`RelayChainProvider`] over an alloy wallet provider.

use std::time::Duration;

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{PendingTransactionError, Provider};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_transport::TransportError;

/// Default number of seconds to wait for a settlement receipt.
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 30;

/// A prepared settlement transaction: target, calldata, and gas terms.
#[derive(Debug, Clone)]
pub struct RelayTransaction {
    /// Target contract address (the asset contract).
    pub to: Address,
    /// Encoded function call.
    pub calldata: Bytes,
    /// Gas limit to submit with, already floored by the calldata-
    /// proportional minimum.
    pub gas_limit: u64,
    /// Number of block confirmations to wait for.
    pub confirmations: u64,
}

/// What the engine needs to know about a mined settlement transaction.
#[derive(Debug, Clone, Copy)]
pub struct RelayReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: TxHash,
    /// Whether execution succeeded. A mined-but-reverted transaction has a
    /// hash and `success == false`.
    pub success: bool,
}

/// Errors from submitting a relay transaction.
#[derive(Debug, thiserror::Error)]
pub enum RelaySendError {
    /// RPC transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The transaction was submitted but the receipt never arrived.
    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),
    /// Anything else, e.g. a fake provider's scripted failure.
    #[error("{0}")]
    Custom(String),
}

/// Sends settlement transactions with an operator-held relay key.
pub trait RelayProvider: Send + Sync {
    /// Address the relay signs from.
    fn relay_address(&self) -> Address;

    /// Asks the node for an execution-cost gas estimate of calling `to`
    /// with `calldata` from the relay address.
    fn estimate_gas(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> impl Future<Output = Result<u64, RelaySendError>> + Send;

    /// Signs and submits the transaction, waiting for the requested number
    /// of confirmations.
    fn send_transaction(
        &self,
        tx: RelayTransaction,
    ) -> impl Future<Output = Result<RelayReceipt, RelaySendError>> + Send;
}

/// [`RelayProvider`] over an alloy provider with a wallet attached.
#[derive(Debug)]
pub struct RelayChainProvider<P> {
    inner: P,
    relay_address: Address,
    receipt_timeout_secs: u64,
}

impl<P> RelayChainProvider<P> {
    /// Wraps a wallet-backed provider signing from `relay_address`.
    pub const fn new(inner: P, relay_address: Address) -> Self {
        Self {
            inner,
            relay_address,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
        }
    }

    /// Overrides how long to wait for a settlement receipt.
    #[must_use]
    pub const fn with_receipt_timeout(mut self, seconds: u64) -> Self {
        self.receipt_timeout_secs = seconds;
        self
    }
}

impl<P: Provider> RelayProvider for RelayChainProvider<P> {
    fn relay_address(&self) -> Address {
        self.relay_address
    }

    async fn estimate_gas(&self, to: Address, calldata: Bytes) -> Result<u64, RelaySendError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_from(self.relay_address)
            .with_input(calldata);
        let gas = self.inner.estimate_gas(tx).await?;
        Ok(gas)
    }

    async fn send_transaction(&self, tx: RelayTransaction) -> Result<RelayReceipt, RelaySendError> {
        let request = TransactionRequest::default()
            .with_to(tx.to)
            .with_from(self.relay_address)
            .with_input(tx.calldata)
            .with_gas_limit(tx.gas_limit);

        let pending = self.inner.send_transaction(request).await?;
        let receipt = pending
            .with_required_confirmations(tx.confirmations)
            .with_timeout(Some(Duration::from_secs(self.receipt_timeout_secs)))
            .get_receipt()
            .await?;

        Ok(RelayReceipt {
            transaction_hash: receipt.transaction_hash,
            success: receipt.status(),
        })
    }
}
