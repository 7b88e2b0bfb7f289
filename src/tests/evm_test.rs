// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Scenario tests for the compatibility runtime.
//!
//! Contracts are closures installed in [`TestHost`]; each test drives them
//! through [`Runtime::execute`] and inspects the host afterwards.

use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use num_bigint::BigUint;

use super::{contract, TestHost};
use crate::evm::abi::decode_revert_reason;
use crate::evm::call::{derive_create2_address, derive_create_address, CallKind};
use crate::evm::config::RuntimeConfig;
use crate::evm::crypto::keccak256;
use crate::evm::error::revert_with_reason;
use crate::evm::host_functions;
use crate::evm::memory::memory_cost;
use crate::evm::runtime::{InvocationRequest, Runtime};
use crate::evm::storage::scalar_slot;
use crate::evm::traits::{CompatHost, HostMetadata};
use crate::evm::utils::{address_to_word, word_from_u64, word_from_usize, word_to_u64, Address, ZERO_WORD};

const SENDER: Address = [0xAA; 20];
const CALLER: Address = [0x0C; 20];
const TARGET: Address = [0x0D; 20];
const LIBRARY: Address = [0x0E; 20];
const FACTORY: Address = [0x0F; 20];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn request(target: Address, input: Vec<u8>) -> InvocationRequest {
    InvocationRequest::new(target, input, 1_000_000)
}

fn word_at(data: &[u8], index: usize) -> u64 {
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[index * 32..(index + 1) * 32]);
    word_to_u64(&word).unwrap_or(u64::MAX)
}

#[test]
fn test_read_only_call_cannot_write() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.sstore(&scalar_slot(0), &word_from_u64(1))?;
            Ok(vec![])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let result = frame.call_read_only(&TARGET, &[], 100_000)?;
            let mut out = vec![result.success as u8];
            let reason = decode_revert_reason(&result.return_data).unwrap_or_default();
            out.extend_from_slice(reason.as_bytes());
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(result.is_committed());
    assert_eq!(result.return_data()[0], 0);
    let reason = String::from_utf8_lossy(&result.return_data()[1..]).to_string();
    assert!(reason.contains("read-only"), "unexpected reason {}", reason);
    assert!(runtime.host().slot_value(&TARGET, &scalar_slot(0)).is_none());

    // The same write through a plain call lands
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.sstore(&scalar_slot(0), &word_from_u64(1))?;
            Ok(vec![])
        }),
    );
    let runtime = Runtime::new(host);
    assert!(runtime.execute(request(TARGET, vec![])).is_committed());
    assert_eq!(
        runtime.host().slot_value(&TARGET, &scalar_slot(0)),
        Some(word_from_u64(1).to_vec())
    );
}

#[test]
fn test_read_only_applies_to_nested_calls() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.set_balance(TARGET, 100);
    host.install(LIBRARY, contract(|_frame| Ok(b"pong".to_vec())));
    host.install(
        TARGET,
        contract(|frame| {
            let mode = frame.input().first().copied().unwrap_or(0);
            match mode {
                // Value-free calls are fine
                0 => {
                    let read = frame.call_plain(&LIBRARY, &ZERO_WORD, &[], 50_000)?;
                    Ok(vec![read.success as u8])
                }
                1 => {
                    frame.call_plain(&LIBRARY, &word_from_u64(1), &[], 50_000)?;
                    Ok(vec![1])
                }
                _ => {
                    frame.log(&[], b"nope")?;
                    Ok(vec![1])
                }
            }
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let mut out = Vec::new();
            for mode in 0u8..3 {
                let result = frame.call_read_only(&TARGET, &[mode], 200_000)?;
                out.push(result.success as u8);
                if mode == 0 {
                    out.extend_from_slice(&result.return_data);
                }
            }
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(result.is_committed(), "{:?}", result.reason());
    assert_eq!(result.return_data(), &[1, 1, 0, 0]);
    assert_eq!(runtime.host().balance(&TARGET), BigUint::from(100u32));
    assert_eq!(runtime.host().balance(&LIBRARY), BigUint::default());
    assert!(runtime.host().events().is_empty());
}

#[test]
fn test_value_call_in_read_only_call_halts_the_callee() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.set_balance(TARGET, 100);
    host.install(LIBRARY, contract(|_frame| Ok(vec![])));
    host.install(
        TARGET,
        contract(|frame| {
            // Discarding the refusal does not let the callee succeed
            let _ = frame.call_plain(&LIBRARY, &word_from_u64(5), &[], 50_000);
            Ok(vec![1])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let result = frame.call_read_only(&TARGET, &[], 200_000)?;
            let reason = decode_revert_reason(&result.return_data).unwrap_or_default();
            Ok(vec![
                result.success as u8,
                reason.contains("value transfer in read-only call") as u8,
                (result.gas_used == 200_000) as u8,
            ])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert_eq!(result.return_data(), &[0, 1, 1]);
    assert_eq!(runtime.host().balance(&TARGET), BigUint::from(100u32));
    assert_eq!(runtime.host().balance(&LIBRARY), BigUint::default());
}

#[test]
fn test_context_preserving_call_keeps_caller_context() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.install(
        LIBRARY,
        contract(|frame| {
            let sender = address_to_word(frame.context().sender());
            frame.sstore(&scalar_slot(1), &sender)?;
            let identity = word_from_usize(Rc::as_ptr(&frame.context) as usize);
            frame.sstore(&scalar_slot(2), &identity)?;
            if frame.input().first() == Some(&1) {
                return Err(revert_with_reason("library failure", "library"));
            }
            Ok(frame.context().address().to_vec())
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let before = frame.context().clone();
            let stack_before = frame.runtime().call_stack();
            let identity = word_from_usize(Rc::as_ptr(&frame.context) as usize);

            let ok = frame.call_context_preserving(&LIBRARY, &[0], 100_000)?;
            let kept_after_success = frame.context() == &before;
            let same_object = frame.sload(&scalar_slot(2))? == identity;

            let failed = frame.call_context_preserving(&LIBRARY, &[1], 100_000)?;
            let kept_after_failure = frame.context() == &before;
            let stack_restored = frame.runtime().call_stack() == stack_before;

            Ok(vec![
                ok.success as u8,
                kept_after_success as u8,
                same_object as u8,
                (ok.return_data == CALLER.to_vec()) as u8,
                failed.success as u8,
                kept_after_failure as u8,
                stack_restored as u8,
            ])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(result.is_committed());
    assert_eq!(result.return_data(), &[1, 1, 1, 1, 0, 1, 1]);

    // The library wrote into the caller's storage, seeing the caller's sender
    let host = runtime.host();
    assert_eq!(
        host.slot_value(&CALLER, &scalar_slot(1)),
        Some(address_to_word(&SENDER).to_vec())
    );
    assert!(host.slot_value(&LIBRARY, &scalar_slot(1)).is_none());
    assert!(runtime.call_stack().is_empty());
}

#[test]
fn test_call_stack_tracks_active_frames() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        LIBRARY,
        contract(|frame| {
            let stack = frame.runtime().call_stack();
            let inner = stack.last().copied();
            Ok(vec![
                stack.len() as u8,
                inner.map(|f| f.kind == CallKind::ContextPreserving).unwrap_or(false) as u8,
                inner.map(|f| f.storage_owner == CALLER && f.code_address == LIBRARY).unwrap_or(false) as u8,
            ])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let result = frame.call_context_preserving(&LIBRARY, &[], 100_000)?;
            Ok(result.return_data)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert_eq!(result.return_data(), &[2, 1, 1]);
    assert!(runtime.call_stack().is_empty());
}

#[test]
fn test_depth_limit_fails_the_call() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            let depth = frame.depth() as u64;
            frame.sstore(&scalar_slot(depth), &word_from_u64(1))?;
            let result = frame.call_plain(&TARGET, &ZERO_WORD, &[], u64::MAX)?;
            if !result.success {
                frame.sstore(&scalar_slot(100), &word_from_u64(depth))?;
                let reason = decode_revert_reason(&result.return_data).unwrap_or_default();
                if reason.contains("call depth limit reached") {
                    frame.sstore(&scalar_slot(101), &word_from_u64(1))?;
                }
            }
            Ok(vec![])
        }),
    );

    let config = RuntimeConfig::default().with_max_call_depth(3);
    let runtime = Runtime::with_config(host, config);
    let result = runtime.execute(InvocationRequest::new(TARGET, vec![], 10_000_000));
    assert!(result.is_committed(), "{:?}", result.reason());

    let host = runtime.host();
    for depth in 0..=3 {
        assert!(host.slot_value(&TARGET, &scalar_slot(depth)).is_some());
    }
    assert!(host.slot_value(&TARGET, &scalar_slot(4)).is_none());
    assert_eq!(
        host.slot_value(&TARGET, &scalar_slot(100)),
        Some(word_from_u64(3).to_vec())
    );
    assert!(host.slot_value(&TARGET, &scalar_slot(101)).is_some());
}

#[test]
fn test_create_and_create2_addresses() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.register_blueprint(b"child", contract(|frame| Ok(frame.context().address().to_vec())));
    host.install(
        FACTORY,
        contract(|frame| {
            let salt = [7u8; 32];
            let first = frame.create2(&ZERO_WORD, b"child", &salt)?;
            let second = frame.create2(&ZERO_WORD, b"child", &salt)?;
            let plain = frame.create(&ZERO_WORD, b"child")?;

            let mut out = vec![first.success as u8, second.success as u8, plain.success as u8];
            out.extend_from_slice(&first.contract_address.unwrap_or_default());
            out.extend_from_slice(&second.contract_address.unwrap_or_default());
            out.extend_from_slice(&plain.contract_address.unwrap_or_default());
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(FACTORY, vec![]));
    assert!(result.is_committed(), "{:?}", result.reason());
    let data = result.return_data();
    assert_eq!(&data[..3], &[1, 0, 1]);

    let salted = derive_create2_address(&FACTORY, &[7u8; 32], b"child");
    assert_eq!(&data[3..23], &salted);
    // A collision still reports the address it derived
    assert_eq!(&data[23..43], &salted);
    // Both create2 attempts consumed a nonce
    let plain = derive_create_address(&FACTORY, 2);
    assert_eq!(&data[43..63], &plain);

    assert!(runtime.host().has_code(&salted));
    assert!(runtime.host().has_code(&plain));
    let call = runtime.execute(request(plain, vec![]));
    assert_eq!(call.return_data(), &plain);
}

#[test]
fn test_create_with_unknown_init_code_fails() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        FACTORY,
        contract(|frame| {
            let result = frame.create(&ZERO_WORD, b"missing")?;
            Ok(vec![result.success as u8, result.contract_address.is_some() as u8])
        }),
    );
    let runtime = Runtime::new(host);
    let result = runtime.execute(request(FACTORY, vec![]));
    assert_eq!(result.return_data(), &[0, 1]);
    assert_eq!(runtime.host().nonce(&FACTORY), 1);
}

#[test]
fn test_create_in_read_only_call_halts_the_callee() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.register_blueprint(b"child", contract(|_frame| Ok(vec![])));
    host.install(
        FACTORY,
        contract(|frame| {
            let salted = frame.input().first() == Some(&1);
            if salted {
                frame.create2(&ZERO_WORD, b"child", &[7u8; 32])?;
            } else {
                frame.create(&ZERO_WORD, b"child")?;
            }
            Ok(vec![1])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let mut out = Vec::new();
            for mode in 0u8..2 {
                let result = frame.call_read_only(&FACTORY, &[mode], 200_000)?;
                let reason = decode_revert_reason(&result.return_data).unwrap_or_default();
                out.push(result.success as u8);
                out.push(reason.contains("create in read-only call") as u8);
                out.push((result.gas_used == 200_000) as u8);
            }
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(result.is_committed(), "{:?}", result.reason());
    assert_eq!(result.return_data(), &[0, 1, 1, 0, 1, 1]);

    let host = runtime.host();
    assert_eq!(host.nonce(&FACTORY), 0);
    assert!(!host.has_code(&derive_create_address(&FACTORY, 0)));
    assert!(!host.has_code(&derive_create2_address(&FACTORY, &[7u8; 32], b"child")));
}

#[test]
fn test_swallowed_fault_still_fails_the_callee() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    // Discards a write refused inside a read-only call
    host.install(
        TARGET,
        contract(|frame| {
            let _ = frame.sstore(&scalar_slot(0), &word_from_u64(1));
            Ok(vec![1])
        }),
    );
    // Discards running out of gas
    host.install(
        LIBRARY,
        contract(|frame| {
            let _ = frame.charge_gas(u64::MAX, "burn");
            let retried = frame.charge_gas(1, "after").is_ok();
            Ok(vec![retried as u8])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let read_only = frame.call_read_only(&TARGET, &[], 100_000)?;
            let burned = frame.call_plain(&LIBRARY, &ZERO_WORD, &[], 10_000)?;
            let reason = decode_revert_reason(&burned.return_data).unwrap_or_default();
            Ok(vec![
                read_only.success as u8,
                (read_only.gas_used == 100_000) as u8,
                burned.success as u8,
                (burned.gas_used == 10_000) as u8,
                reason.contains("out of gas") as u8,
            ])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(result.is_committed(), "{:?}", result.reason());
    assert_eq!(result.return_data(), &[0, 1, 0, 1, 1]);
    assert!(runtime.host().slot_value(&TARGET, &scalar_slot(0)).is_none());
}

#[test]
fn test_read_only_scope_is_released_on_panic() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            if frame.is_read_only() {
                panic!("contract bug");
            }
            Ok(vec![])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            frame.call_read_only(&TARGET, &[], 100_000)?;
            Ok(vec![])
        }),
    );
    host.install(
        LIBRARY,
        contract(|frame| {
            frame.sstore(&scalar_slot(0), &word_from_u64(9))?;
            Ok(vec![])
        }),
    );

    let runtime = Runtime::new(host);
    let panicked = std::panic::catch_unwind(AssertUnwindSafe(|| runtime.execute(request(CALLER, vec![]))));
    assert!(panicked.is_err());
    assert!(!runtime.host().in_static());
    assert!(runtime.call_stack().is_empty());

    let result = runtime.execute(request(LIBRARY, vec![]));
    assert!(result.is_committed(), "{:?}", result.reason());
    assert_eq!(
        runtime.host().slot_value(&LIBRARY, &scalar_slot(0)),
        Some(word_from_u64(9).to_vec())
    );
}

#[test]
fn test_outermost_revert_is_rejected_and_rolled_back() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.sstore(&scalar_slot(0), &word_from_u64(5))?;
            frame.log(&[], b"dropped")?;
            Err(revert_with_reason("insufficient funds", "transfer"))
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(TARGET, vec![]));
    assert!(!result.is_committed());
    assert_eq!(result.reason(), Some("insufficient funds"));
    assert!(result.gas_used() < 1_000_000);
    assert!(runtime.host().slot_value(&TARGET, &scalar_slot(0)).is_none());
    assert!(runtime.host().events().is_empty());
}

#[test]
fn test_outermost_fault_consumes_whole_budget() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.charge_gas(u64::MAX, "burn")?;
            Ok(vec![])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(TARGET, vec![]));
    assert!(!result.is_committed());
    assert_eq!(result.gas_used(), 1_000_000);
    assert!(result.reason().unwrap_or_default().contains("out of gas"));
}

#[test]
fn test_callee_fault_becomes_failed_result() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.mstore(u64::MAX, &[1u8; 32])?;
            Ok(vec![])
        }),
    );
    host.install(
        CALLER,
        contract(|frame| {
            let result = frame.call_plain(&TARGET, &ZERO_WORD, &[], 10_000)?;
            Ok(vec![result.success as u8, (result.gas_used == 10_000) as u8])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(result.is_committed());
    assert_eq!(result.return_data(), &[0, 1]);
}

#[test]
fn test_call_gas_is_capped() {
    let host = TestHost::with_sender(SENDER);
    host.install(TARGET, contract(|frame| Ok(word_from_u64(frame.gas().limit()).to_vec())));
    host.install(
        CALLER,
        contract(|frame| {
            let call_base = frame.runtime().config().gas_schedule.call_base;
            let remaining = frame.gas().remaining() - call_base;
            let expected = remaining - remaining / 64;

            let capped = frame.call_plain(&TARGET, &ZERO_WORD, &[], u64::MAX)?;
            let small = frame.call_plain(&TARGET, &ZERO_WORD, &[], 1_000)?;

            let mut out = word_from_u64(expected).to_vec();
            out.extend_from_slice(&capped.return_data);
            out.extend_from_slice(&small.return_data);
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    let data = result.return_data();
    assert_eq!(word_at(data, 0), word_at(data, 1));
    assert_eq!(word_at(data, 2), 1_000);
}

#[test]
fn test_plain_call_value_is_not_refunded() {
    let host = TestHost::with_sender(SENDER);
    host.set_balance(CALLER, 50);
    host.install(TARGET, contract(|_frame| Err(revert_with_reason("no thanks", "target"))));
    host.install(
        CALLER,
        contract(|frame| {
            let reverted = frame.call_plain(&TARGET, &word_from_u64(20), &[], 100_000)?;
            let too_much = frame.call_plain(&TARGET, &word_from_u64(1_000), &[], 100_000)?;
            let reason = decode_revert_reason(&too_much.return_data).unwrap_or_default();
            Ok(vec![
                reverted.success as u8,
                too_much.success as u8,
                reason.contains("value transfer failed") as u8,
            ])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert_eq!(result.return_data(), &[0, 0, 1]);
    assert_eq!(runtime.host().balance(&CALLER), BigUint::from(30u32));
    assert_eq!(runtime.host().balance(&TARGET), BigUint::from(20u32));
}

#[test]
fn test_invocation_value_moves_before_execution() {
    let host = TestHost::with_sender(SENDER);
    host.set_balance(SENDER, 10);
    host.set_metadata(HostMetadata {
        sender: SENDER,
        value: word_from_u64(10),
        block_number: 7,
        block_timestamp: 99,
    });
    host.install(
        TARGET,
        contract(|frame| {
            let context = frame.context();
            let mut out = context.value().to_vec();
            out.extend_from_slice(&word_from_u64(context.block_number()));
            out.extend_from_slice(context.origin());
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(TARGET, vec![]));
    let data = result.return_data();
    assert_eq!(word_at(data, 0), 10);
    assert_eq!(word_at(data, 1), 7);
    assert_eq!(&data[64..84], &SENDER);
    assert_eq!(runtime.host().balance(&TARGET), BigUint::from(10u32));

    // A second transfer of the same value is short
    let rejected = runtime.execute(request(TARGET, vec![]));
    assert!(!rejected.is_committed());
    assert!(rejected.reason().unwrap_or_default().contains("insufficient balance"));
}

#[test]
fn test_frame_status_reports_usage() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.mstore(2, &word_from_u64(1))?;
            frame.sstore(&scalar_slot(0), &word_from_u64(1))?;
            frame.sload(&scalar_slot(1))?;
            frame.log(&[[1u8; 32]], b"x")?;

            let status = frame.status();
            let mut out = Vec::new();
            for value in [
                status.memory_bytes,
                status.memory_cost,
                status.slots_touched as u64,
                status.logs_emitted as u64,
                status.depth as u64,
                status.gas_used + status.gas_remaining,
            ] {
                out.extend_from_slice(&word_from_u64(value));
            }
            Ok(out)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(TARGET, vec![]));
    let data = result.return_data();
    assert_eq!(word_at(data, 0), 96);
    assert_eq!(word_at(data, 1), memory_cost(3));
    assert_eq!(word_at(data, 2), 2);
    assert_eq!(word_at(data, 3), 1);
    assert_eq!(word_at(data, 4), 0);
    assert_eq!(word_at(data, 5), 1_000_000);
}

#[test]
fn test_memory_out_of_range_rejects_invocation() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            frame.mload_bytes(0, 4096)?;
            Ok(vec![])
        }),
    );
    let config = RuntimeConfig::default().with_max_memory_bytes(1024);
    let runtime = Runtime::with_config(host, config);
    let result = runtime.execute(request(TARGET, vec![]));
    assert!(!result.is_committed());
    assert!(result.reason().unwrap_or_default().contains("out of bounds"));
}

#[test]
fn test_slot_cache_is_transparent() {
    fn counter() -> super::SharedCode {
        contract(|frame| {
            let slot = scalar_slot(0);
            let current = frame.sload(&slot)?;
            if frame.input().first() == Some(&1) {
                frame.sstore(&slot, &word_from_u64(999))?;
                return Err(revert_with_reason("undo", "counter"));
            }
            let next = word_from_u64(word_to_u64(&current).unwrap_or(0) + 1);
            frame.sstore(&slot, &next)?;
            Ok(frame.sload(&slot)?.to_vec())
        })
    }

    let plain = TestHost::with_sender(SENDER);
    plain.install(TARGET, counter());
    let plain = Runtime::new(plain);

    let cached = TestHost::with_sender(SENDER);
    cached.install(TARGET, counter());
    let cached = Runtime::with_config(cached, RuntimeConfig::default().with_storage_cache(true));
    assert!(cached.slot_cache().is_some());

    for input in [0u8, 0, 1, 0] {
        let a = plain.execute(request(TARGET, vec![input]));
        let b = cached.execute(request(TARGET, vec![input]));
        assert_eq!(a, b);
    }
    assert_eq!(
        plain.host().slot_value(&TARGET, &scalar_slot(0)),
        Some(word_from_u64(3).to_vec())
    );
    assert_eq!(
        cached.host().slot_value(&TARGET, &scalar_slot(0)),
        plain.host().slot_value(&TARGET, &scalar_slot(0))
    );
}

#[test]
fn test_host_functions_through_memory() {
    let host = TestHost::with_sender(SENDER);
    host.install(
        TARGET,
        contract(|frame| {
            host_functions::call_data_copy(frame, 0, 0, 32)?;
            frame.write_bytes32(32, &word_from_u64(42))?;
            host_functions::storage_store(frame, 0, 32)?;
            host_functions::storage_load(frame, 0, 64)?;
            host_functions::keccak256(frame, 64, 32, 96)?;
            host_functions::emit_log1(frame, 64, 32, 96)?;
            host_functions::finish(frame, 64, 64)
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(TARGET, word_from_u64(9).to_vec()));
    assert!(result.is_committed(), "{:?}", result.reason());

    let data = result.return_data();
    assert_eq!(&data[..32], &word_from_u64(42));
    assert_eq!(&data[32..], &keccak256(&word_from_u64(42)));
    assert_eq!(
        runtime.host().slot_value(&TARGET, &scalar_slot(9)),
        Some(word_from_u64(42).to_vec())
    );

    let events = runtime.host().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_name, "LOG1");
    assert_eq!(events[0].topics, vec![keccak256(&word_from_u64(42))]);
}

#[test]
fn test_call_data_and_return_data_copies() {
    let host = TestHost::with_sender(SENDER);
    host.install(TARGET, contract(|_frame| Ok(vec![7, 8, 9])));
    host.install(
        CALLER,
        contract(|frame| {
            host_functions::call_data_copy(frame, 0, 0, 4)?;
            let padded = frame.mload_bytes(0, 4)?;

            frame.write_address(64, &TARGET)?;
            frame.write_bytes32(96, &ZERO_WORD)?;
            let success = host_functions::call_contract(frame, 50_000, 64, 96, 32, 0)?;
            let size = host_functions::get_return_data_size(frame);
            host_functions::return_data_copy(frame, 128, 0, 3)?;
            let copied = frame.mload_bytes(128, 3)?;

            let mut out = padded;
            out.extend_from_slice(&[success as u8, size as u8]);
            out.extend_from_slice(&copied);
            Ok(out)
        }),
    );
    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![0xAB, 0xCD]));
    assert_eq!(result.return_data(), &[0xAB, 0xCD, 0, 0, 1, 3, 7, 8, 9]);
}

#[test]
fn test_return_data_overrun_halts_the_frame() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    host.install(TARGET, contract(|_frame| Ok(vec![7, 8, 9])));
    host.install(
        CALLER,
        contract(|frame| {
            frame.call_plain(&TARGET, &ZERO_WORD, &[], 50_000)?;
            let _ = host_functions::return_data_copy(frame, 0, 1, 3);
            // Later work is refused too
            let stored = frame.sstore(&scalar_slot(0), &word_from_u64(1)).is_ok();
            Ok(vec![stored as u8])
        }),
    );

    let runtime = Runtime::new(host);
    let result = runtime.execute(request(CALLER, vec![]));
    assert!(!result.is_committed());
    assert_eq!(result.gas_used(), 1_000_000);
    assert!(result.reason().unwrap_or_default().contains("return_data_copy"));
    assert!(runtime.host().slot_value(&CALLER, &scalar_slot(0)).is_none());
}

#[test]
fn test_deploy_transaction() {
    init_logger();
    let host = TestHost::with_sender(SENDER);
    let init_code = b"echo".to_vec();
    host.register_blueprint(&init_code, contract(|frame| Ok(frame.input().to_vec())));
    let runtime = Runtime::new(host);

    let (address, result) = runtime.deploy(&init_code, 1_000_000);
    assert!(result.is_committed());
    assert_eq!(address, derive_create_address(&SENDER, 0));
    assert!(runtime.host().has_code(&address));
    assert_eq!(runtime.host().nonce(&SENDER), 1);

    let result = runtime.execute(request(address, vec![1, 2, 3]));
    assert_eq!(result.return_data(), &[1, 2, 3]);

    let (missing, result) = runtime.deploy(b"unknown", 1_000_000);
    assert_eq!(missing, derive_create_address(&SENDER, 1));
    assert!(result.reason().unwrap().contains("unknown init code"));
    assert!(!runtime.host().has_code(&missing));
    assert_eq!(runtime.host().nonce(&SENDER), 1);
}
