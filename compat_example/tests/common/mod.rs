// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Test the public module
//! Contains all the functions and tools shared by all tests.

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod calldata;
pub mod decode;

pub use compat_example::contracts::{ContractCalls, Counter, SimpleTarget, SimpleToken};
pub use compat_example::mock_host::{blueprint_id, constructor_args, init_code, MockHost, MockHostBuilder};
pub use evm_compat::evm::{InvocationRequest, InvocationResult, Runtime};

pub use calldata::*;
pub use decode::*;

/// Gas given to every test transaction
pub const GAS_LIMIT: u64 = 10_000_000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn calculate_selector(signature: &str) -> [u8; 4] {
    use sha3::{Digest, Keccak256};
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Helper function to create a test address
pub fn random_test_address(byte: u8) -> [u8; 20] {
    let mut addr = [0u8; 20];
    addr[19] = byte; // Set the last byte to distinguish addresses
    addr
}

/// Submit `call_data` to `target` and return what the submitter sees
pub fn send(runtime: &Runtime<MockHost>, target: [u8; 20], call_data: Vec<u8>) -> InvocationResult {
    runtime.execute(InvocationRequest::new(target, call_data, GAS_LIMIT))
}

/// Submit a call that must commit and return its output
pub fn call_ok(runtime: &Runtime<MockHost>, target: [u8; 20], call_data: Vec<u8>) -> Vec<u8> {
    match send(runtime, target, call_data) {
        InvocationResult::Committed { return_data, .. } => return_data,
        InvocationResult::Rejected { reason, .. } => panic!("call rejected: {}", reason),
    }
}

/// Deploy the blueprint `name` from the current sender
pub fn deploy(runtime: &Runtime<MockHost>, name: &str, constructor: &[u8]) -> [u8; 20] {
    let (address, result) = runtime.deploy(&init_code(name, constructor), GAS_LIMIT);
    assert!(result.is_committed(), "deploying {} failed: {:?}", name, result.reason());
    address
}
