//! The verify/settle contract shared by every facilitator implementation.
//!
//! Two implementations exist: the local EVM engine in `s402-evm`, and the
//! HTTP client in `s402-http` that forwards to an upstream operator-run
//! facilitator. The engine itself holds a boxed [`Facilitator`] per chain
//! for the forwarding branch, so each path returns the same tagged result
//! type even though their failure surfaces differ (RPC vs HTTP).

use std::future::Future;
use std::pin::Pin;

use crate::error::FacilitatorError;
use crate::proto::{PaymentRequirements, SettleResponse, VerifyResponse};

/// A boxed future returned by [`Facilitator`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Verifies and settles x402 payment authorizations.
pub trait Facilitator: Send + Sync {
    /// Verifies a base64-encoded payment header against the given
    /// requirements.
    fn verify<'a>(
        &'a self,
        payment_header: &'a str,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, FacilitatorError>>;

    /// Settles a base64-encoded payment header against the given
    /// requirements.
    fn settle<'a>(
        &'a self,
        payment_header: &'a str,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, FacilitatorError>>;
}
