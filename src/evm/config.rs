// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! [`RuntimeConfig::default`] gives the limits contracts compiled against the
//! foreign model expect: a call depth of 1024 and a constant-cost gas
//! schedule. Individual values are overridden with the `with_*` setters.

/// Default maximum nesting of calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Default addressable memory per frame (32 MiB)
pub const DEFAULT_MAX_MEMORY_BYTES: u64 = 32 * 1024 * 1024;

/// Constant per-operation costs charged against a frame budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSchedule {
    pub storage_load: u64,
    pub storage_store: u64,
    pub log_base: u64,
    pub log_topic: u64,
    pub log_data_byte: u64,
    pub call_base: u64,
    pub value_transfer: u64,
    pub create_base: u64,
    pub hash_base: u64,
    pub hash_word: u64,
}

impl GasSchedule {
    /// Schedule where every operation has the same cost and data is free
    pub fn new(operation_cost: u64) -> Self {
        Self {
            storage_load: operation_cost,
            storage_store: operation_cost,
            log_base: operation_cost,
            log_topic: 0,
            log_data_byte: 0,
            call_base: operation_cost,
            value_transfer: 0,
            create_base: operation_cost,
            hash_base: operation_cost,
            hash_word: 0,
        }
    }

    /// Cost of one log record
    pub fn log_cost(&self, topics: usize, data_len: usize) -> u64 {
        self.log_base
            .saturating_add(self.log_topic.saturating_mul(topics as u64))
            .saturating_add(self.log_data_byte.saturating_mul(data_len as u64))
    }

    /// Cost of hashing `len` bytes
    pub fn hash_cost(&self, len: usize) -> u64 {
        let words = (len as u64).div_ceil(32);
        self.hash_base
            .saturating_add(self.hash_word.saturating_mul(words))
    }
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            storage_load: 800,
            storage_store: 5000,
            log_base: 375,
            log_topic: 375,
            log_data_byte: 8,
            call_base: 700,
            value_transfer: 9000,
            create_base: 32000,
            hash_base: 30,
            hash_word: 6,
        }
    }
}

/// Limits and switches for one [`Runtime`](crate::evm::runtime::Runtime)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Deepest allowed frame; the outermost frame has depth 0
    pub max_call_depth: usize,
    /// Addressable bytes of one frame's memory region
    pub max_memory_bytes: u64,
    /// Keep a write-through slot cache in front of the host store
    pub storage_cache: bool,
    pub gas_schedule: GasSchedule,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            storage_cache: false,
            gas_schedule: GasSchedule::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_memory_bytes(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    pub fn with_storage_cache(mut self, enabled: bool) -> Self {
        self.storage_cache = enabled;
        self
    }

    pub fn with_gas_schedule(mut self, schedule: GasSchedule) -> Self {
        self.gas_schedule = schedule;
        self
    }
}
