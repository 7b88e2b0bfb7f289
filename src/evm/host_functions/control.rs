// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Execution control host functions
//!
//! Contract code ends a frame by returning the result of [`finish`] or
//! [`revert`]; there is no out-of-band exit.

use crate::evm::error::{execution_error, revert_error, HostFunctionResult};
use crate::evm::frame::Frame;
use crate::evm::traits::CompatHost;
use crate::evm::utils::validate_range;

/// Finish execution and return data (RETURN opcode)
///
/// Parameters:
/// - data_offset: Memory offset of the return data
/// - length: Length of the return data
pub fn finish<H: CompatHost>(frame: &mut Frame<'_, H>, data_offset: u64, length: u64) -> HostFunctionResult<Vec<u8>> {
    frame.mload_bytes(data_offset, length)
}

/// Revert execution (REVERT opcode)
///
/// Always returns an error carrying the revert data; propagate it with `?`.
pub fn revert<H: CompatHost>(frame: &mut Frame<'_, H>, data_offset: u64, length: u64) -> HostFunctionResult<Vec<u8>> {
    let revert_data = frame.mload_bytes(data_offset, length)?;
    Err(revert_error(revert_data, "revert"))
}

/// Invalid operation (INVALID opcode); halts the frame and consumes its whole budget
pub fn invalid<H: CompatHost>(frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
    frame.track(Err(execution_error("invalid instruction", "invalid")))
}

/// Size of the last call's return data (RETURNDATASIZE)
pub fn get_return_data_size<H: CompatHost>(frame: &Frame<'_, H>) -> u64 {
    frame.return_data().len() as u64
}

/// Copy return data into memory (RETURNDATACOPY)
///
/// Unlike call data, reading past the end of return data halts the frame.
pub fn return_data_copy<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    result_offset: u64,
    data_offset: u64,
    length: u64,
) -> HostFunctionResult<()> {
    let available = frame.return_data().len() as u64;
    let range = validate_range(data_offset, length, available, "return_data_copy");
    let end = frame.track(range)?;
    if length == 0 {
        return Ok(());
    }
    let chunk = frame.return_data()[data_offset as usize..end as usize].to_vec();
    frame.mstore_bytes(result_offset, &chunk)
}
