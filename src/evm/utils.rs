// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Runtime Utilities - Word Conversions and Parameter Validation
//!
//! This module provides the small helpers every component leans on:
//!
//! - **Word conversions** between 20-byte identities, 32-byte words and native integers
//! - **Parameter validation** for offset/length pairs handed in by compiled code
//! - **Debug formatting** of byte strings
//!
//! # Usage
//!
//! ```rust
//! use evm_compat::evm::utils::{format_hex, word_from_u64, word_to_u64};
//!
//! let word = word_from_u64(0x1234);
//! assert_eq!(word_to_u64(&word), Some(0x1234));
//! assert_eq!(format_hex(&word[30..]), "1234");
//! ```

use num_bigint::BigUint;

use crate::evm::error::{out_of_bounds_error, HostFunctionResult};

/// 20-byte account identity
pub type Address = [u8; 20];

/// 32-byte machine word
pub type Bytes32 = [u8; 32];

/// The all-zero word
pub const ZERO_WORD: Bytes32 = [0u8; 32];

// ============================================================================
// Word Conversions
// ============================================================================

/// Format bytes as lowercase hex without prefix
pub fn format_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Format an address as `0x`-prefixed hex
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Big-endian word holding `value`
pub fn word_from_u64(value: u64) -> Bytes32 {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Big-endian word holding `value`
pub fn word_from_usize(value: usize) -> Bytes32 {
    word_from_u64(value as u64)
}

/// Read a word as `u64`, `None` if any of the upper 24 bytes is set
pub fn word_to_u64(word: &Bytes32) -> Option<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(bytes))
}

/// Left-pad an address into a word
pub fn address_to_word(address: &Address) -> Bytes32 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// Take the low 20 bytes of a word
pub fn word_to_address(word: &Bytes32) -> Address {
    last_20_bytes(word)
}

/// Last 20 bytes of a hash, the identity-derivation truncation
pub fn last_20_bytes(hash: &Bytes32) -> Address {
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// True if every byte is zero
pub fn is_zero_word(word: &Bytes32) -> bool {
    word.iter().all(|b| *b == 0)
}

/// Convert a BigUint to a 32-byte array (big-endian, zero-padded)
///
/// Values wider than 256 bits keep their least significant 32 bytes, which is
/// exactly reduction modulo 2^256.
pub fn bigint_to_bytes32(value: &BigUint) -> Bytes32 {
    let mut result = [0u8; 32];
    let bytes = value.to_bytes_be();

    if bytes.len() > 32 {
        result.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        let start_pos = 32 - bytes.len();
        result[start_pos..].copy_from_slice(&bytes);
    }

    result
}

/// Interpret a word as an unsigned big integer
pub fn bytes32_to_bigint(word: &Bytes32) -> BigUint {
    BigUint::from_bytes_be(word)
}

// ============================================================================
// Parameter Validation
// ============================================================================

/// Validate an `(offset, length)` pair and return the exclusive end offset.
///
/// Fails when `offset + length` overflows `u64` or exceeds `limit`.
pub fn validate_range(offset: u64, length: u64, limit: u64, function: &str) -> HostFunctionResult<u64> {
    let end = offset
        .checked_add(length)
        .ok_or_else(|| out_of_bounds_error(offset, length, function))?;
    if end > limit {
        return Err(out_of_bounds_error(offset, length, function));
    }
    Ok(end)
}

/// Convert a validated `u64` offset into `usize`
pub fn to_usize(value: u64, length: u64, function: &str) -> HostFunctionResult<usize> {
    usize::try_from(value).map_err(|_| out_of_bounds_error(value, length, function))
}
