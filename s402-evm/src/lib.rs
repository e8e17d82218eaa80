#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM verification and settlement engine for the s402 facilitator.
//!
//! This crate decides whether an inbound payment authorization is valid —
//! and who actually authorized it — then settles the underlying EIP-3009
//! transfer. Authorizations may be signed by the account owner directly
//! (plain ECDSA) or by a delegated session key acting through a smart
//! account, in which case validity is established on-chain via ERC-1271.
//!
//! # Modules
//!
//! - [`eip712`] - Protocol-exact typed-data hashing for the transfer
//!   authorization and the session-signature wrapper
//! - [`facilitator`] - The verification and settlement engine
//! - [`fees`] - Basis-point fee schedule with floor/ceiling clamps
//! - [`provider`] - The relay transaction boundary for direct settlement

pub mod eip712;
pub mod facilitator;
pub mod fees;
pub mod provider;
