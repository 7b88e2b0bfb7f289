// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Call Frame
//!
//! Bookkeeping for one invocation: its Memory Region, gas budget, storage
//! view, log emitter and a shared reference to its Execution Context.
//! Contract code receives a `&mut Frame` and performs every foreign-model
//! operation through it, so every operation is metered against the frame's
//! budget:
//!
//! - memory growth is charged by the increase of the region's cost
//! - storage reads and writes, logs, hashing and calls are charged from the
//!   runtime's [`GasSchedule`](crate::evm::config::GasSchedule)
//!
//! Running out of gas is a fatal fault of this frame only.
//!
//! The first fatal fault raised through a frame halts it: later operations
//! fail with the same error, and the frame ends failed even if the contract
//! code discarded the error and returned normally.

use std::rc::Rc;

use crate::evm::call::CallKind;
use crate::evm::context::ExecutionContext;
use crate::evm::crypto::{digest_secondary, keccak256};
use crate::evm::error::{HostFunctionError, HostFunctionResult};
use crate::evm::gas::GasMeter;
use crate::evm::log::LogEmitter;
use crate::evm::memory::MemoryRegion;
use crate::evm::runtime::Runtime;
use crate::evm::storage::{StorageSlot, StorageSlotMap};
use crate::evm::traits::CompatHost;
use crate::evm::utils::{Address, Bytes32};

/// Read-only diagnostics of a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStatus {
    pub depth: usize,
    pub kind: CallKind,
    pub memory_bytes: u64,
    pub memory_cost: u64,
    pub slots_touched: usize,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub gas_remaining: u64,
    pub logs_emitted: usize,
}

/// One active invocation
pub struct Frame<'a, H: CompatHost> {
    pub(crate) runtime: &'a Runtime<H>,
    pub(crate) context: Rc<ExecutionContext>,
    input: Vec<u8>,
    code_address: Address,
    kind: CallKind,
    pub(crate) depth: usize,
    memory: MemoryRegion,
    pub(crate) gas: GasMeter,
    storage: StorageSlotMap<'a, H>,
    logs: LogEmitter,
    pub(crate) return_data: Vec<u8>,
    fault: Option<HostFunctionError>,
}

impl<'a, H: CompatHost> Frame<'a, H> {
    pub(crate) fn new(
        runtime: &'a Runtime<H>,
        context: Rc<ExecutionContext>,
        input: Vec<u8>,
        code_address: Address,
        kind: CallKind,
        depth: usize,
        gas_limit: u64,
    ) -> Self {
        let owner = *context.address();
        Self {
            runtime,
            context,
            input,
            code_address,
            kind,
            depth,
            memory: MemoryRegion::new(runtime.config().max_memory_bytes),
            gas: GasMeter::new(gas_limit),
            storage: StorageSlotMap::new(runtime.host(), owner, runtime.slot_cache()),
            logs: LogEmitter::new(owner),
            return_data: Vec::new(),
            fault: None,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Identity whose storage this frame acts on
    pub fn address(&self) -> &Address {
        self.context.address()
    }

    /// Identity whose code is running
    pub fn code_address(&self) -> &Address {
        &self.code_address
    }

    /// Call data of this frame.
    ///
    /// Equals the context input except in context-preserving calls, where
    /// the context is the caller's.
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn gas(&self) -> &GasMeter {
        &self.gas
    }

    pub fn memory(&self) -> &MemoryRegion {
        &self.memory
    }

    /// Return data of the most recent call or create made by this frame
    pub fn return_data(&self) -> &[u8] {
        &self.return_data
    }

    pub fn host(&self) -> &'a H {
        self.runtime.host()
    }

    pub fn runtime(&self) -> &'a Runtime<H> {
        self.runtime
    }

    /// Whether this frame runs inside a read-only call, at any depth
    pub fn is_read_only(&self) -> bool {
        self.runtime.in_read_only()
    }

    /// Fatal fault that halted this frame
    pub fn fault(&self) -> Option<&HostFunctionError> {
        self.fault.as_ref()
    }

    pub(crate) fn take_fault(&mut self) -> Option<HostFunctionError> {
        self.fault.take()
    }

    /// Record the first fatal fault in `result`
    pub(crate) fn track<T>(&mut self, result: HostFunctionResult<T>) -> HostFunctionResult<T> {
        if let Err(err) = &result {
            if err.is_fatal() && self.fault.is_none() {
                log::debug!("frame at depth {} halted: {}", self.depth, err);
                self.fault = Some(err.clone());
            }
        }
        result
    }

    fn ensure_running(&self) -> HostFunctionResult<()> {
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    pub fn charge_gas(&mut self, amount: u64, function: &str) -> HostFunctionResult<()> {
        self.ensure_running()?;
        let result = self.gas.charge(amount, function);
        self.track(result)
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    fn metered<T>(
        &mut self,
        function: &str,
        operation: impl FnOnce(&mut MemoryRegion) -> HostFunctionResult<T>,
    ) -> HostFunctionResult<T> {
        self.ensure_running()?;
        let before = self.memory.current_cost();
        let result = operation(&mut self.memory);
        let value = self.track(result)?;
        let grown = self.memory.current_cost() - before;
        if grown > 0 {
            self.charge_gas(grown, function)?;
        }
        Ok(value)
    }

    /// Store a word at word index `word_address`
    pub fn mstore(&mut self, word_address: u64, value: &Bytes32) -> HostFunctionResult<()> {
        self.metered("mstore", |memory| memory.store(word_address, value))
    }

    /// Load the word at word index `word_address`
    pub fn mload(&mut self, word_address: u64) -> HostFunctionResult<Bytes32> {
        self.metered("mload", |memory| memory.load(word_address))
    }

    pub fn mstore_bytes(&mut self, byte_address: u64, bytes: &[u8]) -> HostFunctionResult<()> {
        self.metered("mstore_bytes", |memory| memory.store_bytes(byte_address, bytes))
    }

    pub fn mload_bytes(&mut self, byte_address: u64, length: u64) -> HostFunctionResult<Vec<u8>> {
        self.metered("mload_bytes", |memory| memory.load_bytes(byte_address, length))
    }

    /// Read 32 bytes at a byte offset
    pub fn read_bytes32(&mut self, offset: u64) -> HostFunctionResult<Bytes32> {
        let bytes = self.mload_bytes(offset, 32)?;
        let mut word = [0u8; 32];
        word.copy_from_slice(&bytes);
        Ok(word)
    }

    /// Read a 20-byte identity at a byte offset
    pub fn read_address(&mut self, offset: u64) -> HostFunctionResult<Address> {
        let bytes = self.mload_bytes(offset, 20)?;
        let mut address = [0u8; 20];
        address.copy_from_slice(&bytes);
        Ok(address)
    }

    pub fn write_bytes32(&mut self, offset: u64, value: &Bytes32) -> HostFunctionResult<()> {
        self.mstore_bytes(offset, value)
    }

    pub fn write_address(&mut self, offset: u64, address: &Address) -> HostFunctionResult<()> {
        self.mstore_bytes(offset, address)
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    pub fn sload(&mut self, slot: &StorageSlot) -> HostFunctionResult<Bytes32> {
        let cost = self.runtime.config().gas_schedule.storage_load;
        self.charge_gas(cost, "storage_load")?;
        let result = self.storage.get(slot);
        self.track(result)
    }

    pub fn sstore(&mut self, slot: &StorageSlot, value: &Bytes32) -> HostFunctionResult<()> {
        let cost = self.runtime.config().gas_schedule.storage_store;
        self.charge_gas(cost, "storage_store")?;
        let result = self.storage.set(slot, value);
        self.track(result)
    }

    // ------------------------------------------------------------------
    // Hashing
    // ------------------------------------------------------------------

    /// Metered Keccak-256
    pub fn keccak256(&mut self, data: &[u8]) -> HostFunctionResult<Bytes32> {
        let cost = self.runtime.config().gas_schedule.hash_cost(data.len());
        self.charge_gas(cost, "keccak256")?;
        Ok(keccak256(data))
    }

    /// Metered SHA-256
    pub fn sha256(&mut self, data: &[u8]) -> HostFunctionResult<Bytes32> {
        let cost = self.runtime.config().gas_schedule.hash_cost(data.len());
        self.charge_gas(cost, "sha256")?;
        Ok(digest_secondary(data))
    }

    // ------------------------------------------------------------------
    // Logs
    // ------------------------------------------------------------------

    /// Emit a raw log record
    pub fn log(&mut self, topics: &[Bytes32], data: &[u8]) -> HostFunctionResult<()> {
        let cost = self.runtime.config().gas_schedule.log_cost(topics.len(), data.len());
        self.charge_gas(cost, "emit_log_event")?;
        let result = self.logs.log(self.runtime.host(), topics, data);
        self.track(result)
    }

    /// Emit a typed event whose first topic is the signature hash
    pub fn emit_event(&mut self, signature: &str, indexed: &[Bytes32], data: &[u8]) -> HostFunctionResult<()> {
        let cost = self
            .runtime
            .config()
            .gas_schedule
            .log_cost(indexed.len() + 1, data.len());
        self.charge_gas(cost, "emit_event")?;
        let result = self.logs.emit_event(self.runtime.host(), signature, indexed, data);
        self.track(result)
    }

    /// Snapshot of this frame's resource usage
    pub fn status(&self) -> FrameStatus {
        FrameStatus {
            depth: self.depth,
            kind: self.kind,
            memory_bytes: self.memory.size(),
            memory_cost: self.memory.current_cost(),
            slots_touched: self.storage.slots_touched(),
            gas_limit: self.gas.limit(),
            gas_used: self.gas.used(),
            gas_remaining: self.gas.remaining(),
            logs_emitted: self.logs.emitted(),
        }
    }
}
