//! Solidity interface definitions for on-chain interactions.
//!
//! Only the functions the engine actually calls are declared:
//! - [`IEIP3009`] — the `transferWithAuthorization` entry point of
//!   USDC-style tokens
//! - [`IERC1271`] — contract-based signature validation on the payer's
//!   smart account (owned by the external delegation contract)
//! - [`Sig6492`] — ABI-decodable body of an EIP-6492 wrapped signature

use alloy_sol_types::sol;

sol! {
    /// Minimal ERC-3009 surface for USDC-style tokens.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-3009>
    #[allow(missing_docs)]
    #[allow(clippy::too_many_arguments)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IEIP3009 {
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            bytes signature
        ) external;
    }
}

sol! {
    /// ERC-1271 contract signature validation.
    ///
    /// The delegation contract behind the payer's smart account implements
    /// this; its session-permission bookkeeping is opaque to the engine.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-1271>
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC1271 {
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4 magicValue);
    }
}

sol! {
    /// Body of an EIP-6492 wrapped signature, preceding the magic suffix.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-6492>
    #[derive(Debug)]
    struct Sig6492 {
        address factory;
        bytes   factoryCalldata;
        bytes   innerSig;
    }
}
