// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic Host Functions
//!
//! # Supported Operations
//!
//! - [`keccak256`] - Keccak-256, the model's primary hash
//! - [`sha256`] - SHA-256, the secondary digest
//! - [`ecrecover`] - secp256k1 signer recovery
//!
//! Hashing is charged `hash_base + hash_word * words` from the runtime's
//! gas schedule.

use crate::evm::crypto::recover_address;
use crate::evm::error::HostFunctionResult;
use crate::evm::frame::Frame;
use crate::evm::traits::CompatHost;

/// SHA256 hash function implementation
///
/// Parameters:
/// - input_offset: Memory offset of the input data
/// - input_length: Length of the input data
/// - result_offset: Memory offset where the 32-byte hash should be written
pub fn sha256<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    input_offset: u64,
    input_length: u64,
    result_offset: u64,
) -> HostFunctionResult<()> {
    let input_data = frame.mload_bytes(input_offset, input_length)?;
    let hash = frame.sha256(&input_data)?;
    frame.write_bytes32(result_offset, &hash)
}

/// Keccak256 hash function implementation
///
/// Parameters:
/// - input_offset: Memory offset of the input data
/// - input_length: Length of the input data
/// - result_offset: Memory offset where the 32-byte hash should be written
pub fn keccak256<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    input_offset: u64,
    input_length: u64,
    result_offset: u64,
) -> HostFunctionResult<()> {
    let input_data = frame.mload_bytes(input_offset, input_length)?;
    let hash = frame.keccak256(&input_data)?;
    frame.write_bytes32(result_offset, &hash)
}

/// Recover the signer of a 32-byte message hash
///
/// Parameters:
/// - hash_offset: Memory offset of the 32-byte message hash
/// - signature_offset: Memory offset of the 65-byte `r ‖ s ‖ v` signature
/// - result_offset: Memory offset where the 20-byte signer is written
///
/// Returns:
/// - 1 if a signer was recovered, 0 otherwise (memory at `result_offset`
///   is left untouched)
pub fn ecrecover<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    hash_offset: u64,
    signature_offset: u64,
    result_offset: u64,
) -> HostFunctionResult<i32> {
    let cost = frame.runtime().config().gas_schedule.hash_cost(0);
    frame.charge_gas(cost, "ecrecover")?;

    let message_hash = frame.read_bytes32(hash_offset)?;
    let signature = frame.mload_bytes(signature_offset, 65)?;

    match recover_address(&message_hash, &signature) {
        Some(signer) => {
            frame.write_address(result_offset, &signer)?;
            Ok(1)
        }
        None => Ok(0),
    }
}
