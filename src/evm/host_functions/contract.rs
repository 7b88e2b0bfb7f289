// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contract interaction host functions
//!
//! Each call function returns 1 when the callee succeeded and 0 when it
//! failed. The callee's return data (or revert payload) is available through
//! [`get_return_data_size`](super::control::get_return_data_size) and
//! [`return_data_copy`](super::control::return_data_copy) either way.

use crate::evm::error::HostFunctionResult;
use crate::evm::frame::Frame;
use crate::evm::traits::CompatHost;

fn success_code(success: bool) -> i32 {
    if success {
        1
    } else {
        0
    }
}

/// Call another contract (CALL opcode)
///
/// Parameters:
/// - gas: Gas limit for the call, capped at the caller's allowance
/// - addr_offset: Memory offset of the 20-byte target contract address
/// - value_offset: Memory offset of the 32-byte value to send
/// - data_offset: Memory offset of the call data
/// - data_length: Length of the call data
///
/// Returns:
/// - 1 if the call succeeded, 0 if it failed
pub fn call_contract<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    gas: u64,
    addr_offset: u64,
    value_offset: u64,
    data_offset: u64,
    data_length: u64,
) -> HostFunctionResult<i32> {
    let target_address = frame.read_address(addr_offset)?;
    let call_value = frame.read_bytes32(value_offset)?;
    let call_data = frame.mload_bytes(data_offset, data_length)?;

    let result = frame.call_plain(&target_address, &call_value, &call_data, gas)?;
    Ok(success_code(result.success))
}

/// Delegate call to another contract (DELEGATECALL opcode)
///
/// Runs the target's code against the current contract's context and
/// storage.
pub fn call_delegate<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    gas: u64,
    addr_offset: u64,
    data_offset: u64,
    data_length: u64,
) -> HostFunctionResult<i32> {
    let target_address = frame.read_address(addr_offset)?;
    let call_data = frame.mload_bytes(data_offset, data_length)?;

    let result = frame.call_context_preserving(&target_address, &call_data, gas)?;
    Ok(success_code(result.success))
}

/// Static call to another contract (STATICCALL opcode)
///
/// Any state mutation inside the callee makes the call fail.
pub fn call_static<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    gas: u64,
    addr_offset: u64,
    data_offset: u64,
    data_length: u64,
) -> HostFunctionResult<i32> {
    let target_address = frame.read_address(addr_offset)?;
    let call_data = frame.mload_bytes(data_offset, data_length)?;

    let result = frame.call_read_only(&target_address, &call_data, gas)?;
    Ok(success_code(result.success))
}

/// Create a new contract (CREATE and CREATE2 opcodes)
///
/// Parameters:
/// - value_offset: Memory offset of the 32-byte value to send
/// - code_offset: Memory offset of the init code
/// - code_length: Length of the init code
/// - salt_offset: Memory offset of the 32-byte salt; `None` for CREATE
/// - result_offset: Memory offset where the 20-byte address is written
///
/// Returns:
/// - 1 if the contract was created, 0 if creation failed
pub fn create_contract<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    value_offset: u64,
    code_offset: u64,
    code_length: u64,
    salt_offset: Option<u64>,
    result_offset: u64,
) -> HostFunctionResult<i32> {
    let value = frame.read_bytes32(value_offset)?;
    let init_code = frame.mload_bytes(code_offset, code_length)?;

    let result = match salt_offset {
        Some(offset) => {
            let salt = frame.read_bytes32(offset)?;
            frame.create2(&value, &init_code, &salt)?
        }
        None => frame.create(&value, &init_code)?,
    };

    match result.contract_address {
        Some(address) if result.success => {
            frame.write_address(result_offset, &address)?;
            Ok(1)
        }
        _ => Ok(0),
    }
}
