//! Wire format types for the x402 payment protocol (version 1).
//!
//! The inbound payment header is a base64-encoded JSON object carrying the
//! protocol version, the payment scheme, the network name, and the signed
//! EIP-3009 authorization. Facilitator `/verify` and `/settle` exchanges
//! reuse the header verbatim alongside a [`PaymentRequirements`] object.
//!
//! # Key Types
//!
//! - [`X402Version1`] - Version marker that serializes as `1`
//! - [`PaymentHeader`] - The decoded payment authorization envelope
//! - [`ExactPayload`] - The signed transfer authorization fields
//! - [`PaymentRequirements`] - Payment terms set by the seller
//! - [`VerifyRequest`] / [`VerifyResponse`] - Verification messages
//! - [`SettleRequest`] / [`SettleResponse`] - Settlement messages

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::Base64Bytes;
use crate::error::FacilitatorError;
use crate::units::{TokenAmount, UnixTimestamp};

/// The payment scheme this facilitator implements.
pub const EXACT_SCHEME: &str = "exact";

/// Settlement success event name.
pub const EVENT_PAYMENT_SETTLED: &str = "payment.settled";

/// Settlement failure event name.
pub const EVENT_PAYMENT_FAILED: &str = "payment.failed";

/// A protocol version marker parameterized by its numeric value.
///
/// Serializes as a bare integer and rejects any other value on
/// deserialization, so a header with the wrong `x402Version` fails to parse
/// instead of being silently accepted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Version<const N: u8>;

impl<const N: u8> Version<N> {
    /// The numeric value of this protocol version.
    pub const VALUE: u8 = N;
}

impl<const N: u8> From<Version<N>> for u8 {
    fn from(_: Version<N>) -> Self {
        N
    }
}

impl<const N: u8> std::fmt::Display for Version<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{N}")
    }
}

impl<const N: u8> Serialize for Version<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(N)
    }
}

impl<'de, const N: u8> Deserialize<'de> for Version<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = u8::deserialize(deserializer)?;
        if v == N {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {N}, got {v}"
            )))
        }
    }
}

/// Version marker for x402 protocol version 1.
pub type X402Version1 = Version<1>;

/// Convenience constant for constructing version-1 protocol messages.
pub const V1: X402Version1 = Version;

/// The signed EIP-3009 transfer authorization carried in a payment header.
///
/// All fields were covered by the payer's signature (directly for an EOA,
/// through the smart account's ERC-1271 validation for a session key).
/// Immutable once parsed: the facilitator only re-derives hashes from it,
/// never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactPayload {
    /// The address authorizing the transfer (EOA or smart account).
    pub from: Address,
    /// The recipient of the transfer.
    pub to: Address,
    /// Transfer amount in the asset's smallest unit.
    pub value: TokenAmount,
    /// Not valid before this timestamp (inclusive).
    pub valid_after: UnixTimestamp,
    /// Not valid at or after this timestamp (exclusive).
    pub valid_before: UnixTimestamp,
    /// Single-use 32-byte replay nonce (a random token, not a counter).
    pub nonce: Bytes,
    /// Raw signature bytes; the encoding is classified by the engine.
    pub signature: Bytes,
    /// The token contract the transfer is drawn against.
    pub asset: Address,
}

/// A decoded x402 payment header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHeader {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme (must be `"exact"`).
    pub scheme: String,
    /// The network name (e.g. `"base-sepolia"`).
    pub network: String,
    /// The signed transfer authorization.
    pub payload: ExactPayload,
}

impl PaymentHeader {
    /// Decodes a base64-encoded payment header.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError::MalformedHeader`] on invalid base64,
    /// invalid JSON, a wrong protocol version, or a wrong scheme.
    pub fn from_base64(encoded: &str) -> Result<Self, FacilitatorError> {
        let header: Self = Base64Bytes::from(encoded)
            .decode_json()
            .map_err(FacilitatorError::MalformedHeader)?;
        if header.scheme != EXACT_SCHEME {
            return Err(FacilitatorError::MalformedHeader(format!(
                "unsupported scheme: {}",
                header.scheme
            )));
        }
        Ok(header)
    }

    /// Encodes this header as base64 JSON.
    ///
    /// # Panics
    ///
    /// Never panics in practice: the header types serialize infallibly.
    #[must_use]
    pub fn to_base64(&self) -> String {
        let json = serde_json::to_vec(self).expect("header serialization is infallible");
        Base64Bytes::encode(json).to_string()
    }
}

/// Payment terms set by the seller, echoed to facilitators on verify and
/// settle so they can derive the expected amount and recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g. `"exact"`).
    pub scheme: String,
    /// The network name.
    pub network: String,
    /// The recipient address for payment.
    pub pay_to: String,
    /// The token asset address.
    pub asset: String,
    /// The amount required, in the asset's smallest unit.
    pub max_amount_required: TokenAmount,
    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,
    /// Human-readable description of the resource being paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Request body for a facilitator `/verify` or `/settle` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The base64-encoded payment header, forwarded verbatim.
    pub payment_header: String,
    /// The seller's payment terms.
    pub payment_requirements: PaymentRequirements,
}

/// Settlement uses the same request shape as verification.
pub type SettleRequest = VerifyRequest;

/// Verdict from a payment verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether the payment authorization is valid.
    pub is_valid: bool,
    /// Machine-readable failure reason, present when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    /// The payer address, present when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResponse {
    /// A successful verdict for `payer`.
    #[must_use]
    pub fn valid(payer: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            payer: Some(payer.into()),
        }
    }

    /// A failed verdict with a machine-readable reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            payer: None,
        }
    }
}

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Settlement event name; [`EVENT_PAYMENT_SETTLED`] on success.
    pub event: String,
    /// Hash of the confirmed settlement transaction, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// The payer address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Failure detail, present when the settlement did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SettleResponse {
    /// A successful settlement outcome.
    #[must_use]
    pub fn settled(tx_hash: impl Into<String>, payer: impl Into<String>) -> Self {
        Self {
            event: EVENT_PAYMENT_SETTLED.to_owned(),
            tx_hash: Some(tx_hash.into()),
            payer: Some(payer.into()),
            error: None,
        }
    }

    /// A failed settlement outcome.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            event: EVENT_PAYMENT_FAILED.to_owned(),
            tx_hash: None,
            payer: None,
            error: Some(error.into()),
        }
    }

    /// Whether this outcome reports a confirmed settlement.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.event == EVENT_PAYMENT_SETTLED && self.tx_hash.is_some()
    }
}

/// A payment kind a facilitator supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    /// Protocol version.
    pub x402_version: u8,
    /// Scheme name.
    pub scheme: String,
    /// Network name.
    pub network: String,
}

/// Response of a facilitator's `/supported` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    /// Supported payment kinds.
    pub kinds: Vec<SupportedKind>,
}
