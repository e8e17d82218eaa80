//! The facilitator error taxonomy.
//!
//! Every failure a `verify` or `settle` call can produce maps onto exactly
//! one of these variants. Nothing here retries: retry policy belongs to the
//! caller, because a blind retry on a payment-adjacent operation risks
//! double settlement. The atomic replay ledger is the only internal safety
//! net.

/// A failed verification or settlement attempt.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// The payment header was unparseable, carried the wrong protocol
    /// version or scheme, or a required field was malformed.
    /// Rejected immediately; never retried.
    #[error("malformed payment header: {0}")]
    MalformedHeader(String),

    /// The header names a network this facilitator has no configuration for.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The authorized value is below the required amount, or the recipient
    /// or asset does not match the requirements. The caller must re-issue
    /// with corrected requirements.
    #[error("amount or recipient mismatch: {0}")]
    AmountOrRecipientMismatch(String),

    /// The authorization's `validBefore` has passed.
    #[error("authorization validity window has expired")]
    WindowExpired,

    /// The authorization's `validAfter` is still in the future.
    #[error("authorization validity window has not started")]
    WindowNotStarted,

    /// The authorization nonce was already consumed. Permanent: this nonce
    /// can never succeed again.
    #[error("authorization nonce already consumed")]
    ReplayedNonce,

    /// Signature verification failed: recovery mismatch, wrong ERC-1271
    /// magic value, a decode failure, or a disallowed signature format.
    /// The caller must obtain a fresh signature.
    #[error("invalid signature: {0}")]
    SignatureInvalid(String),

    /// An upstream facilitator or RPC endpoint could not be reached or
    /// returned a transport-level failure. Surfaced, not retried; the
    /// caller decides whether to retry the whole request.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The settlement transaction was mined but reverted. Funds did not
    /// move; safe to retry with a freshly signed authorization.
    #[error("settlement transaction {0} reverted")]
    SettlementReverted(String),

    /// Settlement could not be submitted at all (gas estimation failure,
    /// missing relay key, or an upstream settle rejection). Fatal for this
    /// attempt.
    #[error("settlement not submitted: {0}")]
    SettlementUnsubmitted(String),
}

impl FacilitatorError {
    /// Machine-readable reason code, used as `invalidReason` in wire
    /// responses.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MalformedHeader(_) => "malformed_header",
            Self::UnsupportedNetwork(_) => "unsupported_network",
            Self::AmountOrRecipientMismatch(_) => "amount_or_recipient_mismatch",
            Self::WindowExpired => "window_expired",
            Self::WindowNotStarted => "window_not_started",
            Self::ReplayedNonce => "replayed_nonce",
            Self::SignatureInvalid(_) => "signature_invalid",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::SettlementReverted(_) => "settlement_reverted",
            Self::SettlementUnsubmitted(_) => "settlement_unsubmitted",
        }
    }
}
