// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Host and Contract Traits
//!
//! This module defines the seams between the compatibility runtime and its
//! collaborators:
//!
//! - [`CompatHost`] is implemented by the host chain integration. It supplies
//!   the key-value store, the native call primitive, the notification
//!   primitive and the current call metadata.
//! - [`ContractCode`] is implemented by compiled contract logic. The host
//!   resolves a target identity to its code and runs it through
//!   [`NativeCall::run`].
//!
//! Hosts take `&self` everywhere: calls re-enter the host while an outer
//! call is still running, so hosts keep their state behind interior
//! mutability.

use crate::evm::call::{CallOutcome, NativeCall};
use crate::evm::error::HostFunctionResult;
use crate::evm::frame::Frame;
use crate::evm::utils::{Address, Bytes32};

/// Log event emitted by a contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEvent {
    /// Address of the contract that emitted the event
    pub contract_address: Address,
    /// `LOG0`..`LOG4` for raw logs, the event name for typed events
    pub event_name: String,
    /// Event data (arbitrary bytes)
    pub data: Vec<u8>,
    /// Event topics (up to 4 topics, each 32 bytes)
    pub topics: Vec<Bytes32>,
}

/// Result of a contract call operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCallResult {
    /// Whether the call succeeded (true) or failed (false)
    pub success: bool,
    /// Return data from the call, or the revert payload on failure
    pub return_data: Vec<u8>,
    /// Gas used by the call
    pub gas_used: u64,
}

impl ContractCallResult {
    /// Create a successful call result
    pub fn success(return_data: Vec<u8>, gas_used: u64) -> Self {
        Self {
            success: true,
            return_data,
            gas_used,
        }
    }

    /// Create a failed call result
    pub fn failure(return_data: Vec<u8>, gas_used: u64) -> Self {
        Self {
            success: false,
            return_data,
            gas_used,
        }
    }
}

/// Result of a contract creation operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCreateResult {
    /// Whether the creation succeeded (true) or failed (false)
    pub success: bool,
    /// Derived address of the contract; set even when creation failed
    pub contract_address: Option<Address>,
    /// Return data from the constructor
    pub return_data: Vec<u8>,
    /// Gas used by the creation
    pub gas_used: u64,
}

impl ContractCreateResult {
    /// Create a successful creation result
    pub fn success(contract_address: Address, return_data: Vec<u8>, gas_used: u64) -> Self {
        Self {
            success: true,
            contract_address: Some(contract_address),
            return_data,
            gas_used,
        }
    }

    /// Create a failed creation result
    pub fn failure(contract_address: Option<Address>, return_data: Vec<u8>, gas_used: u64) -> Self {
        Self {
            success: false,
            contract_address,
            return_data,
            gas_used,
        }
    }
}

/// Metadata of the transaction currently being executed by the host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostMetadata {
    pub sender: Address,
    pub value: Bytes32,
    pub block_number: u64,
    pub block_timestamp: u64,
}

/// Contract logic the host can dispatch to
pub trait ContractCode<H: CompatHost> {
    /// Message-call entry point; returns the call's return data
    fn call(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>>;

    /// Creation entry point, run once right after the code is installed
    fn construct(&self, _frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Contract code backed by a plain function or closure
pub struct FnContract<F>(pub F);

impl<H, F> ContractCode<H> for FnContract<F>
where
    H: CompatHost,
    F: Fn(&mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>>,
{
    fn call(&self, frame: &mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>> {
        (self.0)(frame)
    }
}

/// Wrap a function as contract code
pub fn native<H, F>(function: F) -> FnContract<F>
where
    H: CompatHost,
    F: Fn(&mut Frame<'_, H>) -> HostFunctionResult<Vec<u8>>,
{
    FnContract(function)
}

/// Host chain integration consumed by the runtime.
///
/// Users implement this trait to connect the runtime to their own node,
/// database, or testing environment.
pub trait CompatHost: Sized {
    /// Read from the host key-value store
    fn storage_get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write to the host key-value store.
    ///
    /// Hosts reject writes made while a read-only call is active with a
    /// write-protection error.
    fn storage_set(&self, key: &[u8], value: &[u8]) -> HostFunctionResult<()>;

    /// Forward an event record to the host notification primitive
    fn notify(
        &self,
        emitter: &Address,
        event_name: &str,
        topics: &[Bytes32],
        data: &[u8],
    ) -> HostFunctionResult<()>;

    /// Resolve `target` to its code and run `call` against it.
    ///
    /// Targets without code complete successfully with no return data.
    fn invoke(&self, target: &Address, call: NativeCall<'_, Self>) -> CallOutcome;

    /// Metadata of the current transaction
    fn metadata(&self) -> HostMetadata;

    /// Move native value between accounts; false if the balance is short
    fn transfer(&self, from: &Address, to: &Address, value: &Bytes32) -> bool;

    /// True if `address` holds code or state
    fn account_exists(&self, address: &Address) -> bool;

    /// Creation nonce of `address`
    fn nonce(&self, address: &Address) -> u64;

    fn increment_nonce(&self, address: &Address);

    /// Turn `init_code` into contract code living at `address`
    fn install_code(&self, address: &Address, init_code: &[u8]) -> HostFunctionResult<()>;

    /// Called before the outermost frame starts
    fn begin_transaction(&self) {}

    /// Called after the outermost frame ends; `commit` is false on rejection
    fn end_transaction(&self, _commit: bool) {}
}
