// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Storage Related Host Functions
//!
//! Word-addressed storage over the host key-value store. Each contract sees
//! its own slot space: the physical key is the owner identity followed by
//! the slot.
//!
//! # Functions
//!
//! - [`storage_store`] - Store a 32-byte value at a 32-byte slot (SSTORE)
//! - [`storage_load`] - Load a 32-byte value from a 32-byte slot (SLOAD)
//!
//! Inside a read-only call the host rejects the write and the store fails
//! with a write-protection error.

use crate::evm::error::HostFunctionResult;
use crate::evm::frame::Frame;
use crate::evm::storage::StorageSlot;
use crate::evm::traits::CompatHost;

/// Storage store host function implementation
///
/// Parameters:
/// - key_bytes_offset: Memory offset of the 32-byte slot
/// - value_bytes_offset: Memory offset of the 32-byte value
pub fn storage_store<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    key_bytes_offset: u64,
    value_bytes_offset: u64,
) -> HostFunctionResult<()> {
    let slot = StorageSlot(frame.read_bytes32(key_bytes_offset)?);
    let value = frame.read_bytes32(value_bytes_offset)?;
    frame.sstore(&slot, &value)
}

/// Storage load host function implementation
///
/// Parameters:
/// - key_bytes_offset: Memory offset of the 32-byte slot
/// - result_offset: Memory offset where the 32-byte result is written
pub fn storage_load<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    key_bytes_offset: u64,
    result_offset: u64,
) -> HostFunctionResult<()> {
    let slot = StorageSlot(frame.read_bytes32(key_bytes_offset)?);
    let value = frame.sload(&slot)?;
    frame.write_bytes32(result_offset, &value)
}
