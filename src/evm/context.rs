// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Execution Context
//!
//! Read-only snapshot of one invocation: who is executing, who called, what
//! value came along, the call input and the block it runs in. A context is
//! built once at invocation entry and never mutated. Plain and read-only
//! calls derive a fresh context for the callee; context-preserving calls hand
//! the callee the caller's own context (shared through `Rc`).

use crate::evm::traits::HostMetadata;
use crate::evm::utils::{Address, Bytes32, ZERO_WORD};

/// Immutable per-invocation snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    address: Address,
    sender: Address,
    value: Bytes32,
    input: Vec<u8>,
    origin: Address,
    block_number: u64,
    block_timestamp: u64,
}

impl ExecutionContext {
    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::default()
    }

    /// Outermost context of a transaction targeting `address`
    pub fn from_metadata(metadata: &HostMetadata, address: Address, input: Vec<u8>) -> Self {
        Self {
            address,
            sender: metadata.sender,
            value: metadata.value,
            input,
            origin: metadata.sender,
            block_number: metadata.block_number,
            block_timestamp: metadata.block_timestamp,
        }
    }

    /// Context of a plain or read-only call made by this context's contract
    pub fn derive_call(&self, callee: Address, value: Bytes32, input: Vec<u8>) -> Self {
        Self {
            address: callee,
            sender: self.address,
            value,
            input,
            origin: self.origin,
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
        }
    }

    /// Identity whose storage and balance this invocation acts on
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn value(&self) -> &Bytes32 {
        &self.value
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// Outermost sender of the transaction
    pub fn origin(&self) -> &Address {
        &self.origin
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn block_timestamp(&self) -> u64 {
        self.block_timestamp
    }
}

/// Builder for [`ExecutionContext`]; origin defaults to the sender
#[derive(Clone, Debug, Default)]
pub struct ExecutionContextBuilder {
    address: Address,
    sender: Address,
    value: Option<Bytes32>,
    input: Vec<u8>,
    origin: Option<Address>,
    block_number: u64,
    block_timestamp: u64,
}

impl ExecutionContextBuilder {
    pub fn address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    pub fn value(mut self, value: Bytes32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn input(mut self, input: Vec<u8>) -> Self {
        self.input = input;
        self
    }

    pub fn origin(mut self, origin: Address) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn block_number(mut self, number: u64) -> Self {
        self.block_number = number;
        self
    }

    pub fn block_timestamp(mut self, timestamp: u64) -> Self {
        self.block_timestamp = timestamp;
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            address: self.address,
            sender: self.sender,
            value: self.value.unwrap_or(ZERO_WORD),
            input: self.input,
            origin: self.origin.unwrap_or(self.sender),
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
        }
    }
}
