//! The verification and settlement engine.
//!
//! [`SessionFacilitator`] answers two questions per inbound payment
//! authorization: "is this valid for this amount and recipient, and who
//! signed it?" (`verify`), and "move the money" (`settle`). Both branch on
//! the signature classification: plain EOA signatures are forwarded to an
//! upstream facilitator when one is configured for the chain — general
//! ecrecover verification duplicates what an externally operated,
//! protocol-compliant verifier already does correctly — while
//! smart-account and session-key signatures are validated locally against
//! the payer account's `isValidSignature` and settled with the operator's
//! relay key.
//!
//! The engine never retries and never partially succeeds; every failure is
//! one tagged [`FacilitatorError`]. The replay ledger consume is the only
//! externally visible effect of a `verify` call.

mod contract;
mod error;
mod settle;
mod signature;
mod verify;

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
pub use contract::{IEIP3009, IERC1271, Sig6492};
pub use error::EvmFacilitatorError;
use s402::chain::ChainSettings;
use s402::error::FacilitatorError;
use s402::facilitator::{BoxFuture, Facilitator};
use s402::proto::{
    EXACT_SCHEME, PaymentHeader, PaymentRequirements, SettleResponse, SupportedKind,
    SupportedResponse, VerifyResponse,
};
use s402::replay::ReplayLedger;
pub use settle::{
    BASE_TX_GAS, NONZERO_BYTE_GAS, ZERO_BYTE_GAS, intrinsic_gas, settle_direct, transfer_calldata,
};
pub use signature::{
    EIP6492_MAGIC_SUFFIX, EOA_SIGNATURE_LEN, ERC1271_MAGIC, SESSION_COMPOSITE_LEN,
    SESSION_DIRECT_LEN, SessionCompositeSignature, SignatureEnvelope, unwrap_eip6492, wrap_eip6492,
};
use tracing::info;
pub use verify::{
    RpcSignatureChecker, SignatureCheckError, SignatureChecker, assert_asset, assert_enough_value,
    assert_nonce, assert_recipient, assert_time,
};

use crate::eip712;
use crate::fees::FeeSchedule;
use crate::provider::RelayProvider;

/// Default clock-skew grace in seconds for validity-window checks.
const DEFAULT_CLOCK_SKEW_TOLERANCE: u64 = 30;

/// `maxTimeoutSeconds` sent with requirements derived for upstream calls.
const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 300;

/// Which path established a signature's validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    /// A plain ECDSA signature from the account owner.
    Eoa,
    /// A contract-wallet signature validated via ERC-1271.
    SmartAccount,
    /// A session-key composite validated by the delegation contract.
    SessionKey,
}

/// Result of a successful verification: who pays, under which nonce, and
/// which path validated it.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedPayment {
    /// The payer (the authorization's `from`).
    pub payer: Address,
    /// The consumed replay nonce.
    pub nonce: B256,
    /// The validation path.
    pub kind: SignatureKind,
}

/// Everything the engine holds for one configured chain.
pub struct ChainHandle<C, R> {
    /// Static chain settings from the registry.
    pub settings: ChainSettings,
    /// The on-chain signature validation boundary.
    pub checker: C,
    /// Relay for direct settlement; `None` puts the chain in
    /// forwarding-only mode.
    pub relay: Option<R>,
    /// Upstream facilitator for the EOA forwarding branch.
    pub upstream: Option<Arc<dyn Facilitator>>,
}

impl<C, R> std::fmt::Debug for ChainHandle<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainHandle")
            .field("network", &self.settings.network)
            .field("has_relay", &self.relay.is_some())
            .field("has_upstream", &self.upstream.is_some())
            .finish_non_exhaustive()
    }
}

/// The payment verification and settlement engine.
pub struct SessionFacilitator<C, R> {
    chains: HashMap<String, ChainHandle<C, R>>,
    ledger: Arc<ReplayLedger>,
    fees: FeeSchedule,
    clock_skew_tolerance: u64,
}

impl<C, R> std::fmt::Debug for SessionFacilitator<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFacilitator")
            .field("chains", &self.chains.len())
            .field("consumed_nonces", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

impl<C, R> SessionFacilitator<C, R> {
    /// Creates an engine over the given chains with a fresh replay ledger.
    #[must_use]
    pub fn new(chains: impl IntoIterator<Item = ChainHandle<C, R>>, fees: FeeSchedule) -> Self {
        Self {
            chains: chains
                .into_iter()
                .map(|handle| (handle.settings.network.clone(), handle))
                .collect(),
            ledger: Arc::new(ReplayLedger::new()),
            fees,
            clock_skew_tolerance: DEFAULT_CLOCK_SKEW_TOLERANCE,
        }
    }

    /// Overrides the clock-skew grace (seconds) for validity-window checks.
    /// Zero enforces exact boundaries.
    #[must_use]
    pub const fn with_clock_skew_tolerance(mut self, seconds: u64) -> Self {
        self.clock_skew_tolerance = seconds;
        self
    }

    /// Shares an externally owned replay ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<ReplayLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// The replay ledger.
    #[must_use]
    pub fn ledger(&self) -> &ReplayLedger {
        &self.ledger
    }

    /// Payment kinds this engine supports.
    #[must_use]
    pub fn supported(&self) -> SupportedResponse {
        SupportedResponse {
            kinds: self
                .chains
                .values()
                .map(|handle| SupportedKind {
                    x402_version: 1,
                    scheme: EXACT_SCHEME.to_owned(),
                    network: handle.settings.network.clone(),
                })
                .collect(),
        }
    }

    fn chain(&self, network: &str) -> Result<&ChainHandle<C, R>, FacilitatorError> {
        self.chains
            .get(network)
            .ok_or_else(|| FacilitatorError::UnsupportedNetwork(network.to_owned()))
    }

    /// Amount, recipient, asset, window, and nonce-shape checks shared by
    /// verify and settle. Returns the validated 32-byte nonce.
    fn preconditions(
        &self,
        header: &PaymentHeader,
        chain: &ChainHandle<C, R>,
        expected_amount: U256,
        expected_recipient: Address,
    ) -> Result<B256, FacilitatorError> {
        let payload = &header.payload;
        verify::assert_enough_value(payload.value.into(), expected_amount)?;
        verify::assert_recipient(payload.to, expected_recipient)?;
        verify::assert_asset(payload.asset, chain.settings.asset)?;
        verify::assert_time(
            payload.valid_after,
            payload.valid_before,
            self.clock_skew_tolerance,
        )?;
        verify::assert_nonce(&payload.nonce)
    }

    /// Requirements forwarded to the upstream facilitator, derived from the
    /// expected amount and recipient.
    fn requirements_for(
        &self,
        chain: &ChainHandle<C, R>,
        expected_amount: U256,
        expected_recipient: Address,
    ) -> PaymentRequirements {
        PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: chain.settings.network.clone(),
            pay_to: expected_recipient.to_string(),
            asset: chain.settings.asset.to_string(),
            max_amount_required: expected_amount.into(),
            max_timeout_seconds: DEFAULT_MAX_TIMEOUT_SECONDS,
            description: None,
            mime_type: None,
        }
    }
}

impl<C: SignatureChecker, R: RelayProvider> SessionFacilitator<C, R> {
    /// Verifies a base64-encoded payment authorization.
    ///
    /// On success the authorization's nonce has been atomically consumed for
    /// the verification phase: a second `verify` of the same authorization
    /// returns [`FacilitatorError::ReplayedNonce`], even concurrently.
    ///
    /// # Errors
    ///
    /// Returns a single tagged [`FacilitatorError`]; never partially
    /// succeeds.
    pub async fn verify(
        &self,
        header_b64: &str,
        expected_amount: U256,
        expected_recipient: Address,
    ) -> Result<VerifiedPayment, FacilitatorError> {
        let header = PaymentHeader::from_base64(header_b64)?;
        let chain = self.chain(&header.network)?;
        let nonce = self.preconditions(&header, chain, expected_amount, expected_recipient)?;
        self.ledger.consume_for_verify(nonce)?;

        let envelope = SignatureEnvelope::detect(&header.payload.signature);
        let kind = self
            .validate_signature(
                chain,
                header_b64,
                &header,
                nonce,
                envelope,
                expected_amount,
                expected_recipient,
            )
            .await
            .map_err(FacilitatorError::from)?;

        info!(
            payer = %header.payload.from,
            network = %header.network,
            kind = ?kind,
            "payment verified"
        );
        Ok(VerifiedPayment {
            payer: header.payload.from,
            nonce,
            kind,
        })
    }

    /// Settles a previously verified payment authorization.
    ///
    /// Must only be invoked after a matching successful [`verify`], and
    /// after the off-chain work the payment pays for has succeeded —
    /// settlement is not a gate. The nonce is atomically consumed for the
    /// settlement phase, so at most one settlement of an authorization ever
    /// wins. An abandoned call that already submitted a transaction is not
    /// rolled back; there is no compensating-transaction mechanism.
    ///
    /// [`verify`]: SessionFacilitator::verify
    ///
    /// # Errors
    ///
    /// Returns a single tagged [`FacilitatorError`].
    pub async fn settle(
        &self,
        header_b64: &str,
        verified: &VerifiedPayment,
        expected_amount: U256,
        expected_recipient: Address,
    ) -> Result<SettleResponse, FacilitatorError> {
        self.settle_checked(header_b64, expected_amount, expected_recipient, Some(verified))
            .await
    }

    async fn settle_checked(
        &self,
        header_b64: &str,
        expected_amount: U256,
        expected_recipient: Address,
        verified: Option<&VerifiedPayment>,
    ) -> Result<SettleResponse, FacilitatorError> {
        let header = PaymentHeader::from_base64(header_b64)?;
        let chain = self.chain(&header.network)?;
        let nonce = self.preconditions(&header, chain, expected_amount, expected_recipient)?;

        if let Some(verified) = verified {
            if verified.nonce != nonce || verified.payer != header.payload.from {
                return Err(FacilitatorError::MalformedHeader(
                    "header does not match the verified payment".to_owned(),
                ));
            }
        }

        self.ledger.consume_for_settle(nonce)?;

        let envelope = SignatureEnvelope::detect(&header.payload.signature);
        let response = self
            .execute_settlement(
                chain,
                header_b64,
                &header,
                nonce,
                envelope,
                expected_amount,
                expected_recipient,
            )
            .await
            .map_err(FacilitatorError::from)?;

        info!(
            payer = %header.payload.from,
            network = %header.network,
            tx = response.tx_hash.as_deref().unwrap_or("-"),
            "payment settled"
        );
        Ok(response)
    }

    async fn validate_signature(
        &self,
        chain: &ChainHandle<C, R>,
        header_b64: &str,
        header: &PaymentHeader,
        nonce: B256,
        envelope: SignatureEnvelope,
        expected_amount: U256,
        expected_recipient: Address,
    ) -> Result<SignatureKind, EvmFacilitatorError> {
        if envelope == SignatureEnvelope::SessionDirect {
            return Err(FacilitatorError::SignatureInvalid(
                "97-byte execution-path signatures are not accepted for payment validation"
                    .to_owned(),
            )
            .into());
        }

        let payload = &header.payload;
        match (envelope, &chain.upstream) {
            (SignatureEnvelope::Eoa, Some(upstream)) => {
                let requirements =
                    self.requirements_for(chain, expected_amount, expected_recipient);
                let response = upstream.verify(header_b64, &requirements).await?;
                if response.is_valid {
                    Ok(SignatureKind::Eoa)
                } else {
                    Err(FacilitatorError::SignatureInvalid(
                        response
                            .invalid_reason
                            .unwrap_or_else(|| "rejected by upstream facilitator".to_owned()),
                    )
                    .into())
                }
            }
            _ => {
                let settings = &chain.settings;
                let domain = eip712::asset_domain(
                    &settings.asset_name,
                    &settings.asset_version,
                    settings.chain_id,
                    settings.asset,
                );
                // The hash handed to isValidSignature is the one computed
                // here, never one trusted from the caller; a composite whose
                // structHash does not chain with this domain fails on-chain.
                let signing_hash = eip712::transfer_authorization_hash(payload, nonce, &domain);
                let inner = signature::unwrap_eip6492(&payload.signature);
                let kind = if SessionCompositeSignature::parse(&inner).is_some() {
                    SignatureKind::SessionKey
                } else if envelope == SignatureEnvelope::Eoa {
                    SignatureKind::Eoa
                } else {
                    SignatureKind::SmartAccount
                };
                let magic = chain
                    .checker
                    .check_signature(payload.from, signing_hash, inner)
                    .await?;
                if magic == ERC1271_MAGIC {
                    Ok(kind)
                } else {
                    Err(FacilitatorError::SignatureInvalid(format!(
                        "isValidSignature returned {magic}, expected {ERC1271_MAGIC}"
                    ))
                    .into())
                }
            }
        }
    }

    async fn execute_settlement(
        &self,
        chain: &ChainHandle<C, R>,
        header_b64: &str,
        header: &PaymentHeader,
        nonce: B256,
        envelope: SignatureEnvelope,
        expected_amount: U256,
        expected_recipient: Address,
    ) -> Result<SettleResponse, EvmFacilitatorError> {
        if envelope == SignatureEnvelope::SessionDirect {
            return Err(FacilitatorError::SignatureInvalid(
                "97-byte execution-path signatures are not accepted for settlement".to_owned(),
            )
            .into());
        }

        let payload = &header.payload;
        let split = self.fees.split(payload.value.into());
        info!(
            network = %header.network,
            gross = %payload.value,
            fee = %split.fee,
            net = %split.net,
            "fee split computed"
        );

        match (envelope, &chain.upstream) {
            (SignatureEnvelope::Eoa, Some(upstream)) => {
                let requirements =
                    self.requirements_for(chain, expected_amount, expected_recipient);
                let response = upstream.settle(header_b64, &requirements).await?;
                if response.is_settled() {
                    Ok(response)
                } else {
                    let detail = response
                        .error
                        .unwrap_or_else(|| format!("upstream returned event '{}'", response.event));
                    Err(FacilitatorError::SettlementUnsubmitted(detail).into())
                }
            }
            _ => {
                let Some(relay) = &chain.relay else {
                    return Err(FacilitatorError::SettlementUnsubmitted(
                        "no relay key configured for this chain".to_owned(),
                    )
                    .into());
                };
                let tx_hash = settle::settle_direct(relay, chain.settings.asset, payload, nonce)
                    .await?;
                Ok(SettleResponse::settled(
                    tx_hash.to_string(),
                    payload.from.to_string(),
                ))
            }
        }
    }
}

fn parse_recipient(requirements: &PaymentRequirements) -> Result<Address, FacilitatorError> {
    requirements.pay_to.parse().map_err(|_| {
        FacilitatorError::MalformedHeader(format!(
            "invalid payTo address: {}",
            requirements.pay_to
        ))
    })
}

/// The wire-level facilitator surface.
///
/// Logical rejections become `isValid: false` / a failure event rather
/// than errors, matching the upstream facilitator protocol; the `Result`
/// layer is reserved for transport failures, which this local
/// implementation does not produce.
impl<C: SignatureChecker, R: RelayProvider> Facilitator for SessionFacilitator<C, R> {
    fn verify<'a>(
        &'a self,
        payment_header: &'a str,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, FacilitatorError>> {
        Box::pin(async move {
            let recipient = match parse_recipient(requirements) {
                Ok(address) => address,
                Err(e) => return Ok(VerifyResponse::invalid(e.reason())),
            };
            let amount: U256 = requirements.max_amount_required.into();
            match self.verify(payment_header, amount, recipient).await {
                Ok(verified) => Ok(VerifyResponse::valid(verified.payer.to_string())),
                Err(e) => Ok(VerifyResponse::invalid(e.reason())),
            }
        })
    }

    fn settle<'a>(
        &'a self,
        payment_header: &'a str,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, FacilitatorError>> {
        Box::pin(async move {
            let recipient = match parse_recipient(requirements) {
                Ok(address) => address,
                Err(e) => return Ok(SettleResponse::failed(e.to_string())),
            };
            let amount: U256 = requirements.max_amount_required.into();
            match self
                .settle_checked(payment_header, amount, recipient, None)
                .await
            {
                Ok(response) => Ok(response),
                Err(e) => Ok(SettleResponse::failed(e.to_string())),
            }
        })
    }
}
