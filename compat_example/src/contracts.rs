// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Native Sample Contracts
//!
//! Hand-written equivalents of the usual sample contracts, written against
//! [`Frame`] the way compiled contract code would be:
//!
//! - [`Counter`] - a single counter slot with an event per change
//! - [`SimpleToken`] - ERC20-like token with balances and allowances
//! - [`SimpleTarget`] - value holder used as a call and deployment target
//! - [`ContractCalls`] - proxy exercising every call kind and both creates
//!
//! Every contract dispatches on the 4-byte selector of its input and
//! reverts with an `Error(string)` reason on unknown selectors.

use evm_compat::evm::abi::{decode, decode_call_input, encode, function_selector, AbiType, AbiValue};
use evm_compat::evm::error::revert_with_reason;
use evm_compat::evm::storage::{mapping_element_slot, scalar_slot, StorageSlot};
use evm_compat::evm::utils::{address_to_word, bigint_to_bytes32, bytes32_to_bigint, Address, ZERO_WORD};
use evm_compat::evm::{CompatHost, ContractCode, Frame, HostFunctionResult};
use num_bigint::BigUint;

use crate::mock_host::{constructor_args, init_code};

/// Signature in `abi` whose selector starts `input`
fn dispatch(input: &[u8], abi: &[&'static str], contract: &str) -> HostFunctionResult<&'static str> {
    let selector = input
        .get(..4)
        .ok_or_else(|| revert_with_reason("missing selector", contract))?;
    abi.iter()
        .copied()
        .find(|signature| function_selector(signature)[..] == *selector)
        .ok_or_else(|| revert_with_reason("unknown selector", contract))
}

fn load_uint<H: CompatHost>(frame: &mut Frame<'_, H>, slot: &StorageSlot) -> HostFunctionResult<BigUint> {
    Ok(bytes32_to_bigint(&frame.sload(slot)?))
}

fn store_uint<H: CompatHost>(frame: &mut Frame<'_, H>, slot: &StorageSlot, value: &BigUint) -> HostFunctionResult<()> {
    frame.sstore(slot, &bigint_to_bytes32(value))
}

fn uint_arg(values: &[AbiValue], index: usize) -> BigUint {
    values
        .get(index)
        .and_then(AbiValue::as_uint)
        .cloned()
        .unwrap_or_default()
}

fn address_arg(values: &[AbiValue], index: usize) -> Address {
    values
        .get(index)
        .and_then(AbiValue::as_address)
        .copied()
        .unwrap_or_default()
}

fn bytes_arg(values: &[AbiValue], index: usize) -> Vec<u8> {
    values
        .get(index)
        .and_then(AbiValue::as_bytes)
        .map(<[u8]>::to_vec)
        .unwrap_or_default()
}

fn uint_value(value: BigUint) -> AbiValue {
    AbiValue::Uint(256, value)
}

// ============================================================================
// Counter
// ============================================================================

/// Counter stored in slot 0
pub struct Counter;

impl Counter {
    pub const ABI: &'static [&'static str] = &["count()", "increase()", "decrease()"];
    pub const COUNT_CHANGED: &'static str = "CountChanged(uint256)";
}

impl<H: CompatHost> ContractCode<H> for Counter {
    fn call(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        let slot = scalar_slot(0);
        let count = load_uint(frame, &slot)?;

        let next = match dispatch(frame.input(), Self::ABI, "Counter")? {
            "count()" => return encode(&[uint_value(count)]),
            "increase()" => count + 1u32,
            _ => {
                if count == BigUint::default() {
                    return Err(revert_with_reason("Counter: cannot decrease below zero", "decrease"));
                }
                count - 1u32
            }
        };

        store_uint(frame, &slot, &next)?;
        let data = encode(&[uint_value(next)])?;
        frame.emit_event(Self::COUNT_CHANGED, &[], &data)?;
        Ok(Vec::new())
    }
}

// ============================================================================
// SimpleToken
// ============================================================================

/// ERC20-like token.
///
/// Storage layout: total supply in slot 0, owner in slot 1, balances mapping
/// at slot 2 keyed by the raw 20-byte holder, allowances at slot 3 keyed by
/// owner then spender.
pub struct SimpleToken;

impl SimpleToken {
    pub const ABI: &'static [&'static str] = &[
        "name()",
        "symbol()",
        "decimals()",
        "totalSupply()",
        "balanceOf(address)",
        "allowance(address,address)",
        "transfer(address,uint256)",
        "approve(address,uint256)",
        "transferFrom(address,address,uint256)",
        "mint(address,uint256)",
    ];
    pub const TRANSFER: &'static str = "Transfer(address,address,uint256)";
    pub const APPROVAL: &'static str = "Approval(address,address,uint256)";

    pub fn balance_slot(holder: &Address) -> StorageSlot {
        mapping_element_slot(&scalar_slot(2), holder)
    }

    pub fn allowance_slot(owner: &Address, spender: &Address) -> StorageSlot {
        mapping_element_slot(&mapping_element_slot(&scalar_slot(3), owner), spender)
    }

    fn move_balance<H: CompatHost>(
        frame: &mut Frame<'_, H>,
        from: &Address,
        to: &Address,
        amount: &BigUint,
    ) -> HostFunctionResult<()> {
        let from_slot = Self::balance_slot(from);
        let from_balance = load_uint(frame, &from_slot)?;
        if &from_balance < amount {
            return Err(revert_with_reason("SimpleToken: insufficient balance", "transfer"));
        }
        store_uint(frame, &from_slot, &(from_balance - amount))?;

        let to_slot = Self::balance_slot(to);
        let to_balance = load_uint(frame, &to_slot)?;
        store_uint(frame, &to_slot, &(to_balance + amount))?;

        let data = encode(&[uint_value(amount.clone())])?;
        frame.emit_event(Self::TRANSFER, &[address_to_word(from), address_to_word(to)], &data)
    }
}

impl<H: CompatHost> ContractCode<H> for SimpleToken {
    fn construct(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        let args = decode(&[AbiType::Uint(256)], constructor_args(frame.input()))?;
        let supply = uint_arg(&args, 0);
        let owner = *frame.context().sender();

        store_uint(frame, &scalar_slot(0), &supply)?;
        frame.sstore(&scalar_slot(1), &address_to_word(&owner))?;
        store_uint(frame, &Self::balance_slot(&owner), &supply)?;

        let data = encode(&[uint_value(supply)])?;
        frame.emit_event(Self::TRANSFER, &[ZERO_WORD, address_to_word(&owner)], &data)?;
        Ok(Vec::new())
    }

    fn call(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        let signature = dispatch(frame.input(), Self::ABI, "SimpleToken")?;
        let args = decode_call_input(signature, frame.input())?;
        let caller = *frame.context().sender();

        match signature {
            "name()" => encode(&[AbiValue::String("SimpleToken".to_string())]),
            "symbol()" => encode(&[AbiValue::String("STK".to_string())]),
            "decimals()" => encode(&[AbiValue::Uint(8, BigUint::from(18u32))]),
            "totalSupply()" => {
                let supply = load_uint(frame, &scalar_slot(0))?;
                encode(&[uint_value(supply)])
            }
            "balanceOf(address)" => {
                let balance = load_uint(frame, &Self::balance_slot(&address_arg(&args, 0)))?;
                encode(&[uint_value(balance)])
            }
            "allowance(address,address)" => {
                let slot = Self::allowance_slot(&address_arg(&args, 0), &address_arg(&args, 1));
                let allowance = load_uint(frame, &slot)?;
                encode(&[uint_value(allowance)])
            }
            "transfer(address,uint256)" => {
                Self::move_balance(frame, &caller, &address_arg(&args, 0), &uint_arg(&args, 1))?;
                encode(&[AbiValue::Bool(true)])
            }
            "approve(address,uint256)" => {
                let spender = address_arg(&args, 0);
                let amount = uint_arg(&args, 1);
                store_uint(frame, &Self::allowance_slot(&caller, &spender), &amount)?;
                let data = encode(&[uint_value(amount)])?;
                frame.emit_event(Self::APPROVAL, &[address_to_word(&caller), address_to_word(&spender)], &data)?;
                encode(&[AbiValue::Bool(true)])
            }
            "transferFrom(address,address,uint256)" => {
                let from = address_arg(&args, 0);
                let amount = uint_arg(&args, 2);
                let slot = Self::allowance_slot(&from, &caller);
                let allowance = load_uint(frame, &slot)?;
                if allowance < amount {
                    return Err(revert_with_reason("SimpleToken: insufficient allowance", "transferFrom"));
                }
                store_uint(frame, &slot, &(allowance - &amount))?;
                Self::move_balance(frame, &from, &address_arg(&args, 1), &amount)?;
                encode(&[AbiValue::Bool(true)])
            }
            _ => {
                let owner = frame.sload(&scalar_slot(1))?;
                if owner != address_to_word(&caller) {
                    return Err(revert_with_reason("SimpleToken: caller is not the owner", "mint"));
                }
                let to = address_arg(&args, 0);
                let amount = uint_arg(&args, 1);
                let supply = load_uint(frame, &scalar_slot(0))? + &amount;
                if supply.bits() > 256 {
                    return Err(revert_with_reason("SimpleToken: supply overflow", "mint"));
                }
                store_uint(frame, &scalar_slot(0), &supply)?;
                let balance = load_uint(frame, &Self::balance_slot(&to))? + &amount;
                store_uint(frame, &Self::balance_slot(&to), &balance)?;

                let data = encode(&[uint_value(amount)])?;
                frame.emit_event(Self::TRANSFER, &[ZERO_WORD, address_to_word(&to)], &data)?;
                encode(&[AbiValue::Bool(true)])
            }
        }
    }
}

// ============================================================================
// SimpleTarget
// ============================================================================

/// Value holder in slot 0
pub struct SimpleTarget;

impl SimpleTarget {
    pub const ABI: &'static [&'static str] = &["setValue(uint256)", "getValue()", "whoami()", "fail()"];
    pub const VALUE_SET: &'static str = "ValueSet(address,uint256)";
}

impl<H: CompatHost> ContractCode<H> for SimpleTarget {
    fn construct(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        let args = constructor_args(frame.input()).to_vec();
        if !args.is_empty() {
            let values = decode(&[AbiType::Uint(256)], &args)?;
            store_uint(frame, &scalar_slot(0), &uint_arg(&values, 0))?;
        }
        Ok(Vec::new())
    }

    fn call(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        let signature = dispatch(frame.input(), Self::ABI, "SimpleTarget")?;
        let args = decode_call_input(signature, frame.input())?;

        match signature {
            "setValue(uint256)" => {
                let value = uint_arg(&args, 0);
                store_uint(frame, &scalar_slot(0), &value)?;
                let sender = address_to_word(frame.context().sender());
                let data = encode(&[uint_value(value)])?;
                frame.emit_event(Self::VALUE_SET, &[sender], &data)?;
                Ok(Vec::new())
            }
            "getValue()" => {
                let value = load_uint(frame, &scalar_slot(0))?;
                encode(&[uint_value(value)])
            }
            "whoami()" => {
                let context = frame.context();
                encode(&[
                    AbiValue::Address(*context.address()),
                    AbiValue::Address(*context.sender()),
                ])
            }
            _ => Err(revert_with_reason("SimpleTarget: failure requested", "fail")),
        }
    }
}

// ============================================================================
// ContractCalls
// ============================================================================

/// Proxy forwarding calls to other contracts and deploying [`SimpleTarget`]s.
///
/// The call functions return `(bool success, bytes returnData)`; the deploy
/// functions return the new address and revert if creation failed.
pub struct ContractCalls;

impl ContractCalls {
    pub const ABI: &'static [&'static str] = &[
        "callTarget(address,bytes)",
        "callTargetWithValue(address,bytes,uint256)",
        "staticCallTarget(address,bytes)",
        "delegateCallTarget(address,bytes)",
        "deployTarget(uint256)",
        "deployTarget2(uint256,bytes32)",
    ];

    /// Blueprint name the deploy functions instantiate
    pub const TARGET_BLUEPRINT: &'static str = "SimpleTarget";
}

impl<H: CompatHost> ContractCode<H> for ContractCalls {
    fn call(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        let signature = dispatch(frame.input(), Self::ABI, "ContractCalls")?;
        let args = decode_call_input(signature, frame.input())?;
        let gas = frame.gas().remaining();

        let result = match signature {
            "callTarget(address,bytes)" => {
                frame.call_plain(&address_arg(&args, 0), &ZERO_WORD, &bytes_arg(&args, 1), gas)?
            }
            "callTargetWithValue(address,bytes,uint256)" => {
                let value = bigint_to_bytes32(&uint_arg(&args, 2));
                frame.call_plain(&address_arg(&args, 0), &value, &bytes_arg(&args, 1), gas)?
            }
            "staticCallTarget(address,bytes)" => {
                frame.call_read_only(&address_arg(&args, 0), &bytes_arg(&args, 1), gas)?
            }
            "delegateCallTarget(address,bytes)" => {
                frame.call_context_preserving(&address_arg(&args, 0), &bytes_arg(&args, 1), gas)?
            }
            _ => {
                let constructor = encode(&[uint_value(uint_arg(&args, 0))])?;
                let code = init_code(Self::TARGET_BLUEPRINT, &constructor);
                let created = match args.get(1).and_then(AbiValue::as_bytes) {
                    Some(salt) => {
                        let mut word = [0u8; 32];
                        word.copy_from_slice(salt);
                        frame.create2(&ZERO_WORD, &code, &word)?
                    }
                    None => frame.create(&ZERO_WORD, &code)?,
                };
                return match created.contract_address {
                    Some(address) if created.success => encode(&[AbiValue::Address(address)]),
                    _ => Err(revert_with_reason("ContractCalls: deployment failed", "deploy")),
                };
            }
        };

        log::debug!("ContractCalls: {} -> success {}", signature, result.success);
        encode(&[AbiValue::Bool(result.success), AbiValue::Bytes(result.return_data)])
    }
}
