// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Mathematical operation host functions

use crate::evm::error::HostFunctionResult;
use crate::evm::frame::Frame;
use crate::evm::math;
use crate::evm::traits::CompatHost;
use crate::evm::utils::Bytes32;

fn ternary<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    function: &str,
    offsets: [u64; 3],
    result_offset: u64,
    operation: fn(&Bytes32, &Bytes32, &Bytes32) -> Bytes32,
) -> HostFunctionResult<()> {
    let cost = frame.runtime().config().gas_schedule.hash_base;
    frame.charge_gas(cost, function)?;

    let a = frame.read_bytes32(offsets[0])?;
    let b = frame.read_bytes32(offsets[1])?;
    let n = frame.read_bytes32(offsets[2])?;
    let result = operation(&a, &b, &n);
    frame.write_bytes32(result_offset, &result)
}

/// Modular addition: (a + b) % n
///
/// Parameters:
/// - a_offset: Memory offset of the first 32-byte operand
/// - b_offset: Memory offset of the second 32-byte operand
/// - n_offset: Memory offset of the 32-byte modulus
/// - result_offset: Memory offset where the 32-byte result should be written
pub fn addmod<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    a_offset: u64,
    b_offset: u64,
    n_offset: u64,
    result_offset: u64,
) -> HostFunctionResult<()> {
    ternary(frame, "addmod", [a_offset, b_offset, n_offset], result_offset, math::addmod)
}

/// Modular multiplication: (a * b) % n
pub fn mulmod<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    a_offset: u64,
    b_offset: u64,
    n_offset: u64,
    result_offset: u64,
) -> HostFunctionResult<()> {
    ternary(frame, "mulmod", [a_offset, b_offset, n_offset], result_offset, math::mulmod)
}

/// Modular exponentiation: (base ^ exp) % mod
pub fn expmod<H: CompatHost>(
    frame: &mut Frame<'_, H>,
    base_offset: u64,
    exp_offset: u64,
    mod_offset: u64,
    result_offset: u64,
) -> HostFunctionResult<()> {
    ternary(frame, "expmod", [base_offset, exp_offset, mod_offset], result_offset, math::expmod)
}
