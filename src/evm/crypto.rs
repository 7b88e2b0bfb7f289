// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Hashing and Signature Recovery
//!
//! Pure cryptographic primitives shared by every other component.
//!
//! # Hash Functions
//!
//! - [`hash256`] / [`keccak256`] - Keccak-256, the foreign model's primary hash.
//!   Used for slot derivation, selectors, event topics and address derivation.
//! - [`digest_secondary`] - SHA-256, required by some signature schemes.
//!
//! # Signature Recovery
//!
//! [`recover_signer`] recovers a secp256k1 public key from a prehashed message,
//! a 64-byte `r ‖ s` signature and a recovery id. Invalid input is an expected
//! outcome and yields `None`; it never raises.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::evm::utils::{last_20_bytes, Address, Bytes32};

/// Uncompressed secp256k1 public key without the `0x04` prefix (`x ‖ y`)
pub type PublicKey = [u8; 64];

/// Keccak-256 over the order-sensitive concatenation of `parts`
pub fn hash256(parts: &[&[u8]]) -> Bytes32 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Keccak-256 of a single buffer
pub fn keccak256(data: &[u8]) -> Bytes32 {
    hash256(&[data])
}

/// SHA-256 digest
pub fn digest_secondary(data: &[u8]) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Recover the signer's public key.
///
/// `signature` must be exactly 64 bytes (`r ‖ s`). `recovery_id` accepts the
/// raw form (0, 1) and the legacy form (27, 28). Both low and high `s` values
/// are accepted.
pub fn recover_signer(message_hash: &Bytes32, signature: &[u8], recovery_id: u8) -> Option<PublicKey> {
    if signature.len() != 64 {
        return None;
    }

    let id = match recovery_id {
        0 | 27 => 0u8,
        1 | 28 => 1u8,
        _ => return None,
    };
    let signature = Signature::from_slice(signature).ok()?;
    // Any s in [1, n) is accepted; a high s maps to n - s with the other parity
    let (signature, id) = match signature.normalize_s() {
        Some(low) => (low, id ^ 1),
        None => (signature, id),
    };
    let recovery_id = RecoveryId::try_from(id).ok()?;

    let key = VerifyingKey::recover_from_prehash(message_hash, &signature, recovery_id).ok()?;
    let encoded = key.to_encoded_point(false);
    let bytes = encoded.as_bytes();
    if bytes.len() != 65 {
        return None;
    }

    let mut public_key = [0u8; 64];
    public_key.copy_from_slice(&bytes[1..]);
    Some(public_key)
}

/// Account identity of a public key: last 20 bytes of its Keccak-256
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    last_20_bytes(&keccak256(public_key))
}

/// Recover the signer address from a 65-byte `r ‖ s ‖ v` signature
pub fn recover_address(message_hash: &Bytes32, signature: &[u8]) -> Option<Address> {
    if signature.len() != 65 {
        return None;
    }
    recover_signer(message_hash, &signature[..64], signature[64])
        .map(|public_key| public_key_to_address(&public_key))
}
