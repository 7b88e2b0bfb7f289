// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Frame Memory Region
//!
//! Linear scratch memory owned by one call frame. Memory is a byte buffer
//! segmented into 32-byte words and grows on demand:
//!
//! - Any access beyond the current size first grows the region to the smallest
//!   multiple of 32 covering the access.
//! - The size never shrinks, so [`MemoryRegion::current_cost`] never decreases.
//! - Cost of `w` words is `3w + floor(w² / 512)`.
//! - Zero-length byte accesses do not grow the region.
//!
//! Accesses past the configured addressable range fail with an out-of-bounds
//! error, which is fatal to the frame.

use crate::evm::error::HostFunctionResult;
use crate::evm::utils::{to_usize, validate_range, Bytes32};

/// Word size in bytes
pub const WORD_SIZE: u64 = 32;

/// Cost of a memory region spanning `words` words
pub fn memory_cost(words: u64) -> u64 {
    words
        .saturating_mul(3)
        .saturating_add(words.saturating_mul(words) / 512)
}

/// Growable word-addressed memory
#[derive(Clone, Debug)]
pub struct MemoryRegion {
    data: Vec<u8>,
    max_bytes: u64,
    cost: u64,
}

impl MemoryRegion {
    /// Empty region addressable up to `max_bytes`
    pub fn new(max_bytes: u64) -> Self {
        Self {
            data: Vec::new(),
            max_bytes,
            cost: 0,
        }
    }

    /// Current size in bytes (always a multiple of 32)
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Current size in words
    pub fn words(&self) -> u64 {
        self.size() / WORD_SIZE
    }

    /// Cost of the peak size reached so far
    pub fn current_cost(&self) -> u64 {
        self.cost
    }

    /// Store a word at word index `word_address`
    pub fn store(&mut self, word_address: u64, value: &Bytes32) -> HostFunctionResult<()> {
        let offset = self.word_offset(word_address, "mstore")?;
        self.store_bytes(offset, value)
    }

    /// Load the word at word index `word_address`
    pub fn load(&mut self, word_address: u64) -> HostFunctionResult<Bytes32> {
        let offset = self.word_offset(word_address, "mload")?;
        let start = self.ensure(offset, WORD_SIZE, "mload")?;
        let mut word = [0u8; 32];
        word.copy_from_slice(&self.data[start..start + 32]);
        Ok(word)
    }

    /// Write `bytes` starting at byte offset `byte_address`
    pub fn store_bytes(&mut self, byte_address: u64, bytes: &[u8]) -> HostFunctionResult<()> {
        let start = self.ensure(byte_address, bytes.len() as u64, "mstore_bytes")?;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Read `length` bytes starting at byte offset `byte_address`
    pub fn load_bytes(&mut self, byte_address: u64, length: u64) -> HostFunctionResult<Vec<u8>> {
        let start = self.ensure(byte_address, length, "mload_bytes")?;
        let len = to_usize(length, length, "mload_bytes")?;
        Ok(self.data[start..start + len].to_vec())
    }

    fn word_offset(&self, word_address: u64, function: &str) -> HostFunctionResult<u64> {
        word_address
            .checked_mul(WORD_SIZE)
            .ok_or_else(|| crate::evm::error::out_of_bounds_error(word_address, WORD_SIZE, function))
    }

    /// Grow to cover `[offset, offset + length)` and return `offset` as an index
    fn ensure(&mut self, offset: u64, length: u64, function: &str) -> HostFunctionResult<usize> {
        if length == 0 {
            // Nothing is touched, but the index must still be representable
            return to_usize(offset.min(self.size()), length, function);
        }
        let end = validate_range(offset, length, self.max_bytes, function)?;
        if end > self.size() {
            let words = end.div_ceil(WORD_SIZE);
            let new_size = to_usize(words * WORD_SIZE, length, function)?;
            self.data.resize(new_size, 0);
            self.cost = memory_cost(words);
        }
        to_usize(offset, length, function)
    }
}
