#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the s402 session-key payment facilitator.
//!
//! This crate provides the chain-agnostic foundation of the facilitator:
//! the x402 wire format, the error taxonomy, the replay ledger, and the
//! registry of configured chains. The EVM verification and settlement
//! engine lives in `s402-evm`; the upstream HTTP client in `s402-http`.
//!
//! # Overview
//!
//! A payment authorization arrives as a base64-encoded JSON header signed
//! either by the account owner directly (a plain ECDSA signature) or by a
//! delegated session key acting through a smart account (validated on-chain
//! via ERC-1271). The facilitator verifies the authorization, consumes its
//! replay nonce exactly once, and settles the underlying EIP-3009 transfer —
//! either by forwarding to an upstream facilitator or by submitting the
//! transaction itself.
//!
//! # Modules
//!
//! - [`proto`] - Wire format types for payment headers and facilitator messages
//! - [`encoding`] - Base64 transport encoding for payment headers
//! - [`error`] - The facilitator error taxonomy
//! - [`chain`] - Per-chain settings and the chain registry
//! - [`networks`] - Well-known USDC deployments
//! - [`replay`] - The consumed-nonce ledger
//! - [`facilitator`] - The verify/settle trait shared by local and remote facilitators
//! - [`units`] - Token amounts and Unix timestamps with decimal-string serde

pub mod chain;
pub mod encoding;
pub mod error;
pub mod facilitator;
pub mod networks;
pub mod proto;
pub mod replay;
pub mod units;

pub use error::FacilitatorError;
pub use facilitator::{BoxFuture, Facilitator};
pub use replay::ReplayLedger;
