//! The consumed-nonce ledger.
//!
//! Every payment authorization carries a random 32-byte nonce that may be
//! acted upon at most once per phase. The ledger is the single source of
//! truth preventing double-spend of a signed authorization, and the only
//! shared mutable state in the facilitator.
//!
//! Both consume operations are a single `DashMap` entry operation, so the
//! has-it-been-used check and the mark-it-used write cannot interleave with
//! a concurrent request presenting the same authorization.
//!
//! Entries are never deleted and carry no TTL: validity windows are
//! caller-supplied and unbounded, so no expiry is safe to apply.

use alloy_primitives::B256;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::FacilitatorError;

/// Lifecycle of a consumed nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// The nonce was consumed by a successful verification.
    Verified,
    /// The nonce was consumed by a settlement attempt.
    Settled,
}

/// Tracks consumed authorization nonces for the life of the process.
#[derive(Debug, Default)]
pub struct ReplayLedger(DashMap<B256, ReplayState>);

impl ReplayLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically consumes `nonce` for the verification phase.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError::ReplayedNonce`] if the nonce was already
    /// consumed by any prior verification or settlement.
    pub fn consume_for_verify(&self, nonce: B256) -> Result<(), FacilitatorError> {
        match self.0.entry(nonce) {
            Entry::Occupied(_) => Err(FacilitatorError::ReplayedNonce),
            Entry::Vacant(slot) => {
                slot.insert(ReplayState::Verified);
                Ok(())
            }
        }
    }

    /// Atomically consumes `nonce` for the settlement phase.
    ///
    /// A nonce that was consumed by verification may still be settled once;
    /// an unverified nonce may be settled directly. Either way, at most one
    /// settlement wins.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorError::ReplayedNonce`] if a settlement already
    /// consumed this nonce.
    pub fn consume_for_settle(&self, nonce: B256) -> Result<(), FacilitatorError> {
        match self.0.entry(nonce) {
            Entry::Occupied(mut slot) => match slot.get() {
                ReplayState::Settled => Err(FacilitatorError::ReplayedNonce),
                ReplayState::Verified => {
                    slot.insert(ReplayState::Settled);
                    Ok(())
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(ReplayState::Settled);
                Ok(())
            }
        }
    }

    /// Whether any phase has consumed `nonce`.
    #[must_use]
    pub fn is_consumed(&self, nonce: &B256) -> bool {
        self.0.contains_key(nonce)
    }

    /// Number of consumed nonces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn nonce(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn test_verify_consumes_once() {
        let ledger = ReplayLedger::new();
        assert!(ledger.consume_for_verify(nonce(1)).is_ok());
        assert!(matches!(
            ledger.consume_for_verify(nonce(1)),
            Err(FacilitatorError::ReplayedNonce)
        ));
        assert!(ledger.is_consumed(&nonce(1)));
    }

    #[test]
    fn test_verify_then_settle_passes_then_locks() {
        let ledger = ReplayLedger::new();
        ledger.consume_for_verify(nonce(2)).unwrap();
        assert!(ledger.consume_for_settle(nonce(2)).is_ok());
        assert!(matches!(
            ledger.consume_for_settle(nonce(2)),
            Err(FacilitatorError::ReplayedNonce)
        ));
        assert!(matches!(
            ledger.consume_for_verify(nonce(2)),
            Err(FacilitatorError::ReplayedNonce)
        ));
    }

    #[test]
    fn test_settle_without_verify() {
        let ledger = ReplayLedger::new();
        assert!(ledger.consume_for_settle(nonce(3)).is_ok());
        assert!(matches!(
            ledger.consume_for_settle(nonce(3)),
            Err(FacilitatorError::ReplayedNonce)
        ));
    }

    #[test]
    fn test_concurrent_verify_single_winner() {
        let ledger = Arc::new(ReplayLedger::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(std::thread::spawn(move || {
                ledger.consume_for_verify(nonce(4)).is_ok()
            }));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
    }
}
