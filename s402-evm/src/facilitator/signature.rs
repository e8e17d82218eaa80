//! Signature classification and decomposition.
//!
//! Three binary layouts arrive on the wire, disambiguated purely by length
//! and suffix — classification is stateless and recomputed on every
//! verification, never cached:
//!
//! - 65 bytes: a raw `(r, s, v)` ECDSA signature from an EOA.
//! - `> 32` bytes ending in the EIP-6492 magic suffix: a wrapped
//!   smart-account signature whose body carries deployment data plus an
//!   inner signature.
//! - exactly 149 bytes: a session composite — the session key's proof that
//!   it countersigned a specific domain/struct-hash pair.
//! - exactly 97 bytes: the delegation contract's execution-path format.
//!   It shares a prefix layout with the composite but carries no
//!   domain-bound proof, so it is classified separately and the engine
//!   rejects it outright for payment validation.

use alloy_primitives::{Address, B256, Bytes, FixedBytes, hex};
use alloy_sol_types::SolValue;

use super::contract::Sig6492;

/// The fixed 32-byte magic suffix defined by
/// [EIP-6492](https://eips.ethereum.org/EIPS/eip-6492).
pub const EIP6492_MAGIC_SUFFIX: [u8; 32] =
    hex!("6492649264926492649264926492649264926492649264926492649264926492");

/// The ERC-1271 success magic value (`isValidSignature` selector).
pub const ERC1271_MAGIC: FixedBytes<4> = FixedBytes(hex!("1626ba7e"));

/// Length of a raw EOA signature.
pub const EOA_SIGNATURE_LEN: usize = 65;

/// Length of a session composite signature.
pub const SESSION_COMPOSITE_LEN: usize = 149;

/// Length of the execution-path session format, which is never valid for
/// payment validation.
pub const SESSION_DIRECT_LEN: usize = 97;

/// Classification of a signature's binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEnvelope {
    /// 65 raw bytes, or an unknown length delegated to the default path so
    /// that EOA verification can fail naturally rather than guessing.
    Eoa,
    /// Ends in the EIP-6492 magic suffix; a generic smart-account marker.
    Wrapped,
    /// Exactly 149 bytes: session id, verifying contract, struct hash, and
    /// the session key's ECDSA countersignature.
    SessionComposite,
    /// Exactly 97 bytes: valid only for the delegation contract's execution
    /// entry point. Must be rejected for EIP-1271 payment validation —
    /// accepting it would let a narrower-scoped proof be replayed into a
    /// context requiring a full domain-bound proof.
    SessionDirect,
}

impl SignatureEnvelope {
    /// Classifies a signature by byte length and suffix.
    #[must_use]
    pub fn detect(signature: &[u8]) -> Self {
        let len = signature.len();
        if len > 32 && signature[len - 32..] == EIP6492_MAGIC_SUFFIX {
            Self::Wrapped
        } else if len == EOA_SIGNATURE_LEN {
            Self::Eoa
        } else if len == SESSION_COMPOSITE_LEN {
            Self::SessionComposite
        } else if len == SESSION_DIRECT_LEN {
            Self::SessionDirect
        } else {
            Self::Eoa
        }
    }
}

/// Strips an EIP-6492 wrapper, returning the inner signature.
///
/// Unwrapped input is returned unchanged, so the operation is idempotent.
/// A wrapper whose body fails to ABI-decode also returns the input
/// unchanged: downstream verification then fails closed instead of a
/// malformed wrapper crashing the engine.
#[must_use]
pub fn unwrap_eip6492(signature: &Bytes) -> Bytes {
    let len = signature.len();
    if !(len > 32 && signature[len - 32..] == EIP6492_MAGIC_SUFFIX) {
        return signature.clone();
    }
    let body = &signature[..len - 32];
    match Sig6492::abi_decode_params(body) {
        Ok(wrapper) => wrapper.innerSig,
        Err(_) => signature.clone(),
    }
}

/// Decomposition of a 149-byte session composite signature.
///
/// Constructed transiently during verification and never persisted; the
/// session's existence and permission set live in the delegation contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCompositeSignature {
    /// Identifier of the delegated session.
    pub session_id: B256,
    /// The contract the wrapped struct hash was bound to.
    pub verifying_contract: Address,
    /// The inner EIP-712 struct hash the session key countersigned.
    pub struct_hash: B256,
    /// The session key's 65-byte ECDSA signature.
    pub ecdsa_signature: [u8; 65],
}

impl SessionCompositeSignature {
    /// Splits a signature at fixed offsets 0/32/52/84/149.
    ///
    /// Returns `None` for any length other than exactly 149 bytes.
    #[must_use]
    pub fn parse(signature: &[u8]) -> Option<Self> {
        if signature.len() != SESSION_COMPOSITE_LEN {
            return None;
        }
        let mut ecdsa_signature = [0u8; 65];
        ecdsa_signature.copy_from_slice(&signature[84..149]);
        Some(Self {
            session_id: B256::from_slice(&signature[0..32]),
            verifying_contract: Address::from_slice(&signature[32..52]),
            struct_hash: B256::from_slice(&signature[52..84]),
            ecdsa_signature,
        })
    }

    /// Re-encodes the four fields into the 149-byte wire layout.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(SESSION_COMPOSITE_LEN);
        out.extend_from_slice(self.session_id.as_slice());
        out.extend_from_slice(self.verifying_contract.as_slice());
        out.extend_from_slice(self.struct_hash.as_slice());
        out.extend_from_slice(&self.ecdsa_signature);
        Bytes::from(out)
    }
}

/// ABI-encodes an EIP-6492 wrapper around `inner` and appends the magic
/// suffix. Used by tests and by clients constructing wrapped signatures.
#[must_use]
pub fn wrap_eip6492(factory: Address, factory_calldata: Bytes, inner: Bytes) -> Bytes {
    let wrapper = Sig6492 {
        factory,
        factoryCalldata: factory_calldata,
        innerSig: inner,
    };
    let mut out = wrapper.abi_encode_params();
    out.extend_from_slice(&EIP6492_MAGIC_SUFFIX);
    Bytes::from(out)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn test_detect_eoa() {
        assert_eq!(
            SignatureEnvelope::detect(&[1u8; 65]),
            SignatureEnvelope::Eoa
        );
    }

    #[test]
    fn test_detect_session_composite() {
        assert_eq!(
            SignatureEnvelope::detect(&[1u8; 149]),
            SignatureEnvelope::SessionComposite
        );
    }

    #[test]
    fn test_detect_session_direct() {
        assert_eq!(
            SignatureEnvelope::detect(&[1u8; 97]),
            SignatureEnvelope::SessionDirect
        );
    }

    #[test]
    fn test_detect_wrapped_regardless_of_body() {
        for body_len in [1usize, 65, 117, 300] {
            let mut bytes = vec![0xabu8; body_len];
            bytes.extend_from_slice(&EIP6492_MAGIC_SUFFIX);
            assert_eq!(
                SignatureEnvelope::detect(&bytes),
                SignatureEnvelope::Wrapped,
                "body_len={body_len}"
            );
        }
    }

    #[test]
    fn test_detect_unknown_lengths_default_to_eoa() {
        for len in [0usize, 1, 32, 64, 96, 100, 148, 150] {
            assert_eq!(
                SignatureEnvelope::detect(&vec![7u8; len]),
                SignatureEnvelope::Eoa,
                "len={len}"
            );
        }
    }

    #[test]
    fn test_unwrap_recovers_inner_signature() {
        let inner = Bytes::from(vec![3u8; 65]);
        let wrapped = wrap_eip6492(
            address!("00000000000000000000000000000000000000aa"),
            Bytes::from(vec![1, 2, 3]),
            inner.clone(),
        );
        assert_eq!(SignatureEnvelope::detect(&wrapped), SignatureEnvelope::Wrapped);
        assert_eq!(unwrap_eip6492(&wrapped), inner);
    }

    #[test]
    fn test_unwrap_is_idempotent_on_plain_signature() {
        let plain = Bytes::from(vec![4u8; 65]);
        assert_eq!(unwrap_eip6492(&plain), plain);
        assert_eq!(unwrap_eip6492(&unwrap_eip6492(&plain)), plain);
    }

    #[test]
    fn test_unwrap_returns_malformed_wrapper_unchanged() {
        // Magic suffix, but the body is not a valid ABI tuple.
        let mut bytes = vec![0xffu8; 7];
        bytes.extend_from_slice(&EIP6492_MAGIC_SUFFIX);
        let bogus = Bytes::from(bytes);
        assert_eq!(unwrap_eip6492(&bogus), bogus);
    }

    #[test]
    fn test_session_composite_roundtrip() {
        let original = SessionCompositeSignature {
            session_id: B256::repeat_byte(0x11),
            verifying_contract: address!("2222222222222222222222222222222222222222"),
            struct_hash: B256::repeat_byte(0x33),
            ecdsa_signature: [0x44u8; 65],
        };
        let encoded = original.encode();
        assert_eq!(encoded.len(), SESSION_COMPOSITE_LEN);
        let parsed = SessionCompositeSignature::parse(&encoded).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_session_composite_rejects_other_lengths() {
        assert!(SessionCompositeSignature::parse(&[0u8; 148]).is_none());
        assert!(SessionCompositeSignature::parse(&[0u8; 150]).is_none());
        assert!(SessionCompositeSignature::parse(&[0u8; 97]).is_none());
        assert!(SessionCompositeSignature::parse(&[]).is_none());
    }
}
