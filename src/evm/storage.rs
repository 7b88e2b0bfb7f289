// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Storage Slot Map
//!
//! Translates logical storage locations into the opaque keys of the host
//! key-value store.
//!
//! # Addressing
//!
//! - Scalar slot `n` is the 32-byte big-endian word `n`.
//! - Array element `i` of the array rooted at `base` is `hash256(base) + i`
//!   modulo 2^256.
//! - Mapping element for `key` in the mapping rooted at `base` is
//!   `hash256(base ‖ key)`. The result is itself a valid base, so nested
//!   mappings are `mapping_element_slot(mapping_element_slot(base, k1), k2)`.
//!
//! Every contract owns a separate slot space: the physical host key is
//! `owner ‖ slot`.
//!
//! # Caching
//!
//! An optional write-through [`SlotCache`] can sit in front of the host store.
//! Writes reach the host first and only land in the cache once the host has
//! accepted them, so a cached read always equals an uncached one.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;

use crate::evm::crypto::{hash256, keccak256};
use crate::evm::error::{storage_error, HostFunctionResult};
use crate::evm::math::wrapping_add;
use crate::evm::traits::CompatHost;
use crate::evm::utils::{bigint_to_bytes32, format_hex, word_from_u64, Address, Bytes32};

/// Logical 256-bit storage address as seen by contract logic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageSlot(pub Bytes32);

impl StorageSlot {
    pub fn as_bytes(&self) -> &Bytes32 {
        &self.0
    }
}

impl From<Bytes32> for StorageSlot {
    fn from(word: Bytes32) -> Self {
        StorageSlot(word)
    }
}

/// Slot of a scalar state variable
pub fn scalar_slot(id: u64) -> StorageSlot {
    StorageSlot(word_from_u64(id))
}

/// Slot of element `index` of the dynamic array rooted at `base`.
///
/// The index range is unbounded; bounds checking belongs to the caller.
pub fn array_element_slot(base: &StorageSlot, index: &BigUint) -> StorageSlot {
    StorageSlot(wrapping_add(&keccak256(&base.0), &bigint_to_bytes32(index)))
}

/// Slot of the value stored under `key` in the mapping rooted at `base`.
///
/// `key` is hashed as given; callers pass the canonical key bytes
/// (a 20-byte identity, a 32-byte word, raw string bytes).
pub fn mapping_element_slot(base: &StorageSlot, key: &[u8]) -> StorageSlot {
    StorageSlot(hash256(&[&base.0[..], key]))
}

/// Physical host key of `slot` in the slot space of `owner`
pub fn physical_key(owner: &Address, slot: &StorageSlot) -> Vec<u8> {
    let mut key = Vec::with_capacity(52);
    key.extend_from_slice(owner);
    key.extend_from_slice(&slot.0);
    key
}

/// Write-through cache of decoded slot values, keyed by physical key
#[derive(Debug, Default)]
pub struct SlotCache {
    entries: RefCell<HashMap<Vec<u8>, Bytes32>>,
}

impl SlotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes32> {
        self.entries.borrow().get(key).copied()
    }

    pub fn insert(&self, key: Vec<u8>, value: Bytes32) {
        self.entries.borrow_mut().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every entry; called whenever the host discards state
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Slot space of one contract, backed by the host key-value store
pub struct StorageSlotMap<'a, H: CompatHost> {
    host: &'a H,
    owner: Address,
    cache: Option<&'a SlotCache>,
    touched: HashSet<StorageSlot>,
}

impl<'a, H: CompatHost> StorageSlotMap<'a, H> {
    pub fn new(host: &'a H, owner: Address, cache: Option<&'a SlotCache>) -> Self {
        Self {
            host,
            owner,
            cache,
            touched: HashSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Distinct slots read or written through this map
    pub fn slots_touched(&self) -> usize {
        self.touched.len()
    }

    /// Read a slot; never-written slots read as zero
    pub fn get(&mut self, slot: &StorageSlot) -> HostFunctionResult<Bytes32> {
        self.touched.insert(*slot);
        let key = physical_key(&self.owner, slot);

        if let Some(value) = self.cache.and_then(|cache| cache.get(&key)) {
            return Ok(value);
        }

        let value = match self.host.storage_get(&key) {
            None => [0u8; 32],
            Some(bytes) if bytes.len() <= 32 => {
                // Hosts may trim leading zeros
                let mut word = [0u8; 32];
                word[32 - bytes.len()..].copy_from_slice(&bytes);
                word
            }
            Some(bytes) => {
                return Err(storage_error(
                    &format!("stored value is {} bytes wide", bytes.len()),
                    "storage_get",
                    &format_hex(&key),
                ))
            }
        };

        if let Some(cache) = self.cache {
            cache.insert(key, value);
        }
        Ok(value)
    }

    /// Write a slot through to the host store
    pub fn set(&mut self, slot: &StorageSlot, value: &Bytes32) -> HostFunctionResult<()> {
        self.touched.insert(*slot);
        let key = physical_key(&self.owner, slot);
        self.host.storage_set(&key, value)?;
        if let Some(cache) = self.cache {
            cache.insert(key, *value);
        }
        Ok(())
    }
}
