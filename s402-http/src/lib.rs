#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP client for upstream x402 facilitators.
//!
//! The engine forwards plain-EOA payments to an operator-run facilitator
//! instead of reimplementing ecrecover-based verification it does not own.
//! [`HttpFacilitatorClient`] is that forwarding path: it POSTs the
//! base64 payment header and the derived requirements to the upstream's
//! `/verify` and `/settle` endpoints and relays the verdict back as the
//! shared [`Facilitator`](s402::Facilitator) contract.

mod client;

pub use client::{HttpFacilitatorClient, UpstreamConfig};
