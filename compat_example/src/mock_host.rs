// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Mock Host Chain Implementation
//!
//! This module provides an example implementation of [`CompatHost`] for
//! testing and development purposes. Users should create their own host
//! integrations based on their chain's storage and call primitives.
//!
//! State changes are journaled while a transaction is open and undone in
//! reverse order when the runtime reports a rejection.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use evm_compat::evm::call::{CallKind, CallOutcome, NativeCall};
use evm_compat::evm::crypto::keccak256;
use evm_compat::evm::error::{execution_error, write_protection_error};
use evm_compat::evm::storage::{physical_key, StorageSlot};
use evm_compat::evm::utils::{format_address, is_zero_word, Address, Bytes32};
use evm_compat::evm::{CompatHost, ContractCode, HostFunctionResult, HostMetadata};
use evm_compat::LogEvent;
use num_bigint::BigUint;

/// Contract code shared between the registry and running frames
pub type SharedCode = Rc<dyn ContractCode<MockHost>>;

/// Init code deploying the blueprint registered as `name` with constructor
/// arguments `args`: the blueprint id followed by the arguments
pub fn init_code(name: &str, args: &[u8]) -> Vec<u8> {
    let mut code = blueprint_id(name).to_vec();
    code.extend_from_slice(args);
    code
}

/// Identifier a blueprint is registered under
pub fn blueprint_id(name: &str) -> Bytes32 {
    keccak256(name.as_bytes())
}

/// Constructor arguments carried by init code
pub fn constructor_args(init_code: &[u8]) -> &[u8] {
    init_code.get(32..).unwrap_or(&[])
}

enum JournalEntry {
    Storage { key: Vec<u8>, previous: Option<Vec<u8>> },
    Balance { address: Address, previous: Option<BigUint> },
    Nonce { address: Address, previous: Option<u64> },
    Code { address: Address, previous: Option<SharedCode> },
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

/// In-memory host chain
pub struct MockHost {
    storage: RefCell<HashMap<Vec<u8>, Vec<u8>>>,
    balances: RefCell<HashMap<Address, BigUint>>,
    nonces: RefCell<HashMap<Address, u64>>,
    codes: RefCell<HashMap<Address, SharedCode>>,
    blueprints: RefCell<HashMap<Bytes32, SharedCode>>,
    events: RefCell<Vec<LogEvent>>,
    journal: RefCell<Vec<JournalEntry>>,
    events_mark: Cell<Option<usize>>,
    metadata: Cell<HostMetadata>,
    static_depth: Cell<usize>,
    invocations: Cell<usize>,
}

/// Builder for MockHost with fluent interface
pub struct MockHostBuilder {
    metadata: HostMetadata,
    balances: Vec<(Address, u64)>,
    contracts: Vec<(Address, SharedCode)>,
    blueprints: Vec<(String, SharedCode)>,
}

impl MockHostBuilder {
    pub fn new() -> Self {
        let mut sender = [0u8; 20];
        sender[0] = 0x04;

        Self {
            metadata: HostMetadata {
                sender,
                value: [0u8; 32],
                block_number: 12345,
                block_timestamp: 1_234_567_890,
            },
            balances: Vec::new(),
            contracts: Vec::new(),
            blueprints: Vec::new(),
        }
    }

    /// Set the transaction sender
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.metadata.sender = sender;
        self
    }

    /// Set the value attached to the transaction
    pub fn with_value(mut self, value: Bytes32) -> Self {
        self.metadata.value = value;
        self
    }

    pub fn with_block_number(mut self, number: u64) -> Self {
        self.metadata.block_number = number;
        self
    }

    pub fn with_block_timestamp(mut self, timestamp: u64) -> Self {
        self.metadata.block_timestamp = timestamp;
        self
    }

    pub fn with_balance(mut self, address: Address, balance: u64) -> Self {
        self.balances.push((address, balance));
        self
    }

    /// Install code at a fixed address
    pub fn with_contract(mut self, address: Address, code: impl ContractCode<MockHost> + 'static) -> Self {
        self.contracts.push((address, Rc::new(code)));
        self
    }

    /// Make `code` deployable through [`init_code`] with `name`
    pub fn with_blueprint(mut self, name: &str, code: impl ContractCode<MockHost> + 'static) -> Self {
        self.blueprints.push((name.to_string(), Rc::new(code)));
        self
    }

    pub fn build(self) -> MockHost {
        let host = MockHost {
            storage: RefCell::new(HashMap::new()),
            balances: RefCell::new(HashMap::new()),
            nonces: RefCell::new(HashMap::new()),
            codes: RefCell::new(HashMap::new()),
            blueprints: RefCell::new(HashMap::new()),
            events: RefCell::new(Vec::new()),
            journal: RefCell::new(Vec::new()),
            events_mark: Cell::new(None),
            metadata: Cell::new(self.metadata),
            static_depth: Cell::new(0),
            invocations: Cell::new(0),
        };
        for (address, balance) in self.balances {
            host.balances.borrow_mut().insert(address, BigUint::from(balance));
        }
        for (address, code) in self.contracts {
            host.codes.borrow_mut().insert(address, code);
        }
        for (name, code) in self.blueprints {
            host.blueprints.borrow_mut().insert(blueprint_id(&name), code);
        }
        host
    }
}

impl Default for MockHostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn builder() -> MockHostBuilder {
        MockHostBuilder::new()
    }

    /// Change who submits the next transaction
    pub fn set_sender(&self, sender: Address) {
        let mut metadata = self.metadata.get();
        metadata.sender = sender;
        self.metadata.set(metadata);
    }

    pub fn set_value(&self, value: Bytes32) {
        let mut metadata = self.metadata.get();
        metadata.value = value;
        self.metadata.set(metadata);
    }

    pub fn balance_of(&self, address: &Address) -> BigUint {
        self.balances.borrow().get(address).cloned().unwrap_or_default()
    }

    pub fn has_code(&self, address: &Address) -> bool {
        self.codes.borrow().contains_key(address)
    }

    /// Raw value of `owner`'s slot as held by the host store
    pub fn slot(&self, owner: &Address, slot: &StorageSlot) -> Option<Vec<u8>> {
        self.storage.borrow().get(&physical_key(owner, slot)).cloned()
    }

    /// Number of non-zero entries in the host store
    pub fn storage_len(&self) -> usize {
        self.storage.borrow().len()
    }

    /// All events committed so far, in emission order
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Frames dispatched to code since the host was built
    pub fn invocations(&self) -> usize {
        self.invocations.get()
    }

    fn in_static(&self) -> bool {
        self.static_depth.get() > 0
    }

    fn record(&self, entry: JournalEntry) {
        if self.events_mark.get().is_some() {
            self.journal.borrow_mut().push(entry);
        }
    }

    fn set_balance(&self, address: Address, balance: BigUint) {
        let previous = self.balances.borrow_mut().insert(address, balance);
        self.record(JournalEntry::Balance { address, previous });
    }

    fn rollback(&self) {
        let entries: Vec<JournalEntry> = self.journal.borrow_mut().drain(..).collect();
        log::debug!("mock host: rolling back {} journal entries", entries.len());
        for entry in entries.into_iter().rev() {
            match entry {
                JournalEntry::Storage { key, previous } => {
                    let mut storage = self.storage.borrow_mut();
                    match previous {
                        Some(value) => storage.insert(key, value),
                        None => storage.remove(&key),
                    };
                }
                JournalEntry::Balance { address, previous } => {
                    let mut balances = self.balances.borrow_mut();
                    match previous {
                        Some(value) => balances.insert(address, value),
                        None => balances.remove(&address),
                    };
                }
                JournalEntry::Nonce { address, previous } => {
                    let mut nonces = self.nonces.borrow_mut();
                    match previous {
                        Some(value) => nonces.insert(address, value),
                        None => nonces.remove(&address),
                    };
                }
                JournalEntry::Code { address, previous } => {
                    let mut codes = self.codes.borrow_mut();
                    match previous {
                        Some(code) => codes.insert(address, code),
                        None => codes.remove(&address),
                    };
                }
            }
        }
        if let Some(mark) = self.events_mark.get() {
            self.events.borrow_mut().truncate(mark);
        }
    }
}

impl CompatHost for MockHost {
    fn storage_get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.storage.borrow().get(key).cloned()
    }

    fn storage_set(&self, key: &[u8], value: &[u8]) -> HostFunctionResult<()> {
        if self.in_static() {
            let key_hex = format!("0x{}", hex::encode(key));
            log::debug!("mock host: rejected write to {} in read-only call", key_hex);
            return Err(write_protection_error("storage write in read-only call", "storage_set"));
        }
        let mut storage = self.storage.borrow_mut();
        // Zero words are not stored
        let previous = if value.iter().all(|b| *b == 0) {
            storage.remove(key)
        } else {
            storage.insert(key.to_vec(), value.to_vec())
        };
        drop(storage);
        self.record(JournalEntry::Storage {
            key: key.to_vec(),
            previous,
        });
        Ok(())
    }

    fn notify(&self, emitter: &Address, event_name: &str, topics: &[Bytes32], data: &[u8]) -> HostFunctionResult<()> {
        if self.in_static() {
            return Err(write_protection_error("log in read-only call", "notify"));
        }
        log::trace!("mock host: {} from {}", event_name, format_address(emitter));
        self.events.borrow_mut().push(LogEvent {
            contract_address: *emitter,
            event_name: event_name.to_string(),
            data: data.to_vec(),
            topics: topics.to_vec(),
        });
        Ok(())
    }

    fn invoke(&self, target: &Address, call: NativeCall<'_, Self>) -> CallOutcome {
        let code = self.codes.borrow().get(target).cloned();
        let Some(code) = code else {
            return call.no_code();
        };
        self.invocations.set(self.invocations.get() + 1);

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
        if is_zero_word(value) {
            return true;
        }
        let amount = BigUint::from_bytes_be(value);
        let available = self.balance_of(from);
        if available < amount {
            log::debug!("mock host: {} cannot pay {}", format_address(from), amount);
            return false;
        }
        self.set_balance(*from, available - &amount);
        let credited = self.balance_of(to) + amount;
        self.set_balance(*to, credited);
        true
    }

    fn account_exists(&self, address: &Address) -> bool {
        self.has_code(address) || self.nonce(address) > 0 || self.balance_of(address) > BigUint::default()
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.nonces.borrow().get(address).copied().unwrap_or(0)
    }

    fn increment_nonce(&self, address: &Address) {
        let previous = self.nonces.borrow().get(address).copied();
        self.nonces
            .borrow_mut()
            .insert(*address, previous.unwrap_or(0) + 1);
        self.record(JournalEntry::Nonce {
            address: *address,
            previous,
        });
    }

    fn install_code(&self, address: &Address, init_code: &[u8]) -> HostFunctionResult<()> {
        if self.in_static() {
            return Err(write_protection_error("create in read-only call", "install_code"));
        }
        let id: Bytes32 = init_code
            .get(..32)
            .and_then(|prefix| prefix.try_into().ok())
            .ok_or_else(|| execution_error("init code shorter than a blueprint id", "install_code"))?;
        let code = self
            .blueprints
            .borrow()
            .get(&id)
            .cloned()
            .ok_or_else(|| execution_error("unknown blueprint", "install_code"))?;

        let previous = self.codes.borrow_mut().insert(*address, code);
        self.record(JournalEntry::Code {
            address: *address,
            previous,
        });
        Ok(())
    }

    fn begin_transaction(&self) {
        self.journal.borrow_mut().clear();
        self.events_mark.set(Some(self.events.borrow().len()));
    }

    fn end_transaction(&self, commit: bool) {
        if !commit {
            self.rollback();
        }
        self.journal.borrow_mut().clear();
        self.events_mark.set(None);
    }
}
