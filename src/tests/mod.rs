// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Shared in-memory host for the crate's unit and scenario tests.

mod evm_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use num_bigint::BigUint;

use crate::evm::call::{CallKind, CallOutcome, NativeCall};
use crate::evm::error::{execution_error, write_protection_error, HostFunctionResult};
use crate::evm::frame::Frame;
use crate::evm::storage::{physical_key, StorageSlot};
use crate::evm::traits::{CompatHost, ContractCode, FnContract, HostMetadata, LogEvent};
use crate::evm::utils::{Address, Bytes32};

pub(crate) type SharedCode = Rc<dyn ContractCode<TestHost>>;

/// Wrap a closure as shareable contract code
pub(crate) fn contract<F>(function: F) -> SharedCode
where
    F: Fn(&mut Frame<'_, TestHost>) -> HostFunctionResult<Vec<u8>> + 'static,
{
    Rc::new(FnContract(function))
}

#[derive(Clone, Default)]
struct State {
    storage: HashMap<Vec<u8>, Vec<u8>>,
    balances: HashMap<Address, BigUint>,
    nonces: HashMap<Address, u64>,
    codes: HashMap<Address, SharedCode>,
    events: Vec<LogEvent>,
}

/// Holds one level of read-only depth until dropped
struct StaticScope<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> StaticScope<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        StaticScope { depth }
    }
}

impl Drop for StaticScope<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Host with transaction-level rollback and read-only enforcement
#[derive(Default)]
pub(crate) struct TestHost {
    state: RefCell<State>,
    snapshot: RefCell<Option<State>>,
    blueprints: RefCell<HashMap<Vec<u8>, SharedCode>>,
    metadata: Cell<HostMetadata>,
    read_only: Cell<bool>,
    static_depth: Cell<usize>,
}

impl TestHost {
    pub(crate) fn with_sender(sender: Address) -> Self {
        let host = Self::default();
        host.metadata.set(HostMetadata {
            sender,
            block_number: 100,
            block_timestamp: 1_700_000_000,
            ..HostMetadata::default()
        });
        host
    }

    pub(crate) fn set_metadata(&self, metadata: HostMetadata) {
        self.metadata.set(metadata);
    }

    pub(crate) fn install(&self, address: Address, code: SharedCode) {
        self.state.borrow_mut().codes.insert(address, code);
    }

    /// Make `init_code` deployable as `code`
    pub(crate) fn register_blueprint(&self, init_code: &[u8], code: SharedCode) {
        self.blueprints.borrow_mut().insert(init_code.to_vec(), code);
    }

    pub(crate) fn has_code(&self, address: &Address) -> bool {
        self.state.borrow().codes.contains_key(address)
    }

    pub(crate) fn set_balance(&self, address: Address, balance: u64) {
        self.state.borrow_mut().balances.insert(address, BigUint::from(balance));
    }

    pub(crate) fn balance(&self, address: &Address) -> BigUint {
        self.state.borrow().balances.get(address).cloned().unwrap_or_default()
    }

    pub(crate) fn raw_storage(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.state.borrow().storage.get(key).cloned()
    }

    pub(crate) fn put_raw(&self, key: Vec<u8>, value: Vec<u8>) {
        self.state.borrow_mut().storage.insert(key, value);
    }

    /// Word stored in `owner`'s slot, if it was ever written
    pub(crate) fn slot_value(&self, owner: &Address, slot: &StorageSlot) -> Option<Vec<u8>> {
        self.raw_storage(&physical_key(owner, slot))
    }

    pub(crate) fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub(crate) fn events(&self) -> Vec<LogEvent> {
        self.state.borrow().events.clone()
    }

    fn in_static(&self) -> bool {
        self.read_only.get() || self.static_depth.get() > 0
    }
}

impl CompatHost for TestHost {
    fn storage_get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.raw_storage(key)
    }

    fn storage_set(&self, key: &[u8], value: &[u8]) -> HostFunctionResult<()> {
        if self.in_static() {
            return Err(write_protection_error("storage write in read-only call", "storage_set"));
        }
        self.put_raw(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn notify(&self, emitter: &Address, event_name: &str, topics: &[Bytes32], data: &[u8]) -> HostFunctionResult<()> {
        if self.in_static() {
            return Err(write_protection_error("log in read-only call", "notify"));
        }
        self.state.borrow_mut().events.push(LogEvent {
            contract_address: *emitter,
            event_name: event_name.to_string(),
            data: data.to_vec(),
            topics: topics.to_vec(),
        });
        Ok(())
    }

    fn invoke(&self, target: &Address, call: NativeCall<'_, Self>) -> CallOutcome {
        let code = self.state.borrow().codes.get(target).cloned();
        let Some(code) = code else {
            return call.no_code();
        };

        let _scope = (call.kind() == CallKind::ReadOnly).then(|| StaticScope::enter(&self.static_depth));
        call.run(code.as_ref())
    }

    fn metadata(&self) -> HostMetadata {
        self.metadata.get()
    }

    fn transfer(&self, from: &Address, to: &Address, value: &Bytes32) -> bool {
        if self.in_static() {
            return false;
        }
        let amount = BigUint::from_bytes_be(value);
        let mut state = self.state.borrow_mut();
        let available = state.balances.get(from).cloned().unwrap_or_default();
        if available < amount {
            return false;
        }
        state.balances.insert(*from, available - &amount);
        *state.balances.entry(*to).or_default() += amount;
        true
    }

    fn account_exists(&self, address: &Address) -> bool {
        let state = self.state.borrow();
        state.codes.contains_key(address) || state.nonces.get(address).copied().unwrap_or(0) > 0
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.state.borrow().nonces.get(address).copied().unwrap_or(0)
    }

    fn increment_nonce(&self, address: &Address) {
        *self.state.borrow_mut().nonces.entry(*address).or_insert(0) += 1;
    }

    fn install_code(&self, address: &Address, init_code: &[u8]) -> HostFunctionResult<()> {
        if self.in_static() {
            return Err(write_protection_error("create in read-only call", "install_code"));
        }
        let code = self
            .blueprints
            .borrow()
            .get(init_code)
            .cloned()
            .ok_or_else(|| execution_error("unknown init code", "install_code"))?;
        self.install(*address, code);
        Ok(())
    }

    fn begin_transaction(&self) {
        let state = self.state.borrow().clone();
        *self.snapshot.borrow_mut() = Some(state);
    }

    fn end_transaction(&self, commit: bool) {
        let snapshot = self.snapshot.borrow_mut().take();
        if let (false, Some(state)) = (commit, snapshot) {
            *self.state.borrow_mut() = state;
        }
    }
}
