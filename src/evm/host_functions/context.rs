// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Execution context host functions
//!
//! Copy fields of the frame's Execution Context into its Memory Region.
//! Memory growth caused by the copy is charged to the frame.

use crate::evm::error::{out_of_bounds_error, HostFunctionResult};
use crate::evm::frame::Frame;
use crate::evm::traits::CompatHost;

/// Write the address whose storage is being acted on (ADDRESS)
pub fn get_address<H: CompatHost>(frame: &mut Frame<'_, H>, result_offset: u64) -> HostFunctionResult<()> {
    let address = *frame.context().address();
    frame.write_address(result_offset, &address)
}

/// Write the immediate caller (CALLER)
pub fn get_caller<H: CompatHost>(frame: &mut Frame<'_, H>, result_offset: u64) -> HostFunctionResult<()> {
    let caller = *frame.context().sender();
    frame.write_address(result_offset, &caller)
}

/// Write the value attached to the current call (CALLVALUE)
pub fn get_call_value<H: CompatHost>(frame: &mut Frame<'_, H>, result_offset: u64) -> HostFunctionResult<()> {
    let value = *frame.context().value();
    frame.write_bytes32(result_offset, &value)
}

/// Write the transaction originator (ORIGIN)
pub fn get_tx_origin<H: CompatHost>(frame: &mut Frame<'_, H>, result_offset: u64) -> HostFunctionResult<()> {
    let origin = *frame.context().origin();
    frame.write_address(result_offset, &origin)
}

pub fn get_block_number<H: CompatHost>(frame: &Frame<'_, H>) -> u64 {
    frame.context().block_number()
}

pub fn get_block_timestamp<H: CompatHost>(frame: &Frame<'_, H>) -> u64 {
    frame.context().block_timestamp()
}

/// Size of the frame's call data (CALLDATASIZE)
pub fn get_call_data_size<H: CompatHost>(frame: &Frame<'_, H>) -> u64 {
    frame.input().len() as u64
}

/// Copy call data into memory (CALLDATACOPY)
///
/// Bytes past the end of the call data are copied as zeros.
///
/// Parameters:
/// - result_offset: Memory offset to copy to
/// - data_offset: Offset within the call data
/// - length: Number of bytes to copy
pub fn call_data_copy<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    result_offset: u64,
    data_offset: u64,
    length: u64,
) -> HostFunctionResult<()> {
    if length == 0 {
        return Ok(());
    }
    let input = frame.input();
    let start = usize::try_from(data_offset).unwrap_or(usize::MAX).min(input.len());
    let available = &input[start..];
    let take = usize::try_from(length).unwrap_or(usize::MAX).min(available.len());

    let mut chunk = available[..take].to_vec();
    let padding = length - take as u64;
    if padding > 0 {
        let limit = frame.runtime().config().max_memory_bytes;
        if padding > limit {
            return frame.track(Err(out_of_bounds_error(result_offset, length, "call_data_copy")));
        }
        chunk.resize(take + padding as usize, 0);
    }
    frame.mstore_bytes(result_offset, &chunk)
}

