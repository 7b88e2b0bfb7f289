// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! ABI decoding
//!
//! Decoding is strict. Every offset must point past the head of its list and
//! inside the buffer, every length must stay within the buffer, and the
//! padding of static words must be clean. Violations are reported as
//! [`HostFunctionError::AbiDecode`](crate::evm::error::HostFunctionError)
//! with the absolute byte position of the offending word.

use num_bigint::{BigInt, BigUint};

use super::{AbiType, AbiValue};
use crate::evm::error::{abi_decode_error, HostFunctionResult};
use crate::evm::utils::{word_to_u64, Bytes32};

const FUNCTION: &str = "abi_decode";

/// Decode `data` as a parameter list of `types`
pub fn decode(types: &[AbiType], data: &[u8]) -> HostFunctionResult<Vec<AbiValue>> {
    decode_sequence(types, data, 0)
}

/// `data` is the region of one list; `base` its absolute position
fn decode_sequence(types: &[AbiType], data: &[u8], base: usize) -> HostFunctionResult<Vec<AbiValue>> {
    let head_size = types
        .iter()
        .map(AbiType::head_size)
        .fold(0, usize::saturating_add);
    if head_size > data.len() {
        return Err(abi_decode_error(base + data.len(), "buffer shorter than head", FUNCTION));
    }

    let mut values = Vec::with_capacity(types.len());
    let mut position = 0;
    for value_type in types {
        if value_type.is_dynamic() {
            let offset = read_length(data, position, base)?;
            if offset < head_size || offset >= data.len() {
                return Err(abi_decode_error(
                    base + position,
                    &format!("offset {} outside [{}, {})", offset, head_size, data.len()),
                    FUNCTION,
                ));
            }
            values.push(decode_value(value_type, &data[offset..], base + offset)?);
        } else {
            values.push(decode_value(value_type, &data[position..], base + position)?);
        }
        position += value_type.head_size();
    }
    Ok(values)
}

fn decode_value(value_type: &AbiType, data: &[u8], base: usize) -> HostFunctionResult<AbiValue> {
    if let AbiType::Uint(bits) | AbiType::Int(bits) = value_type {
        if *bits == 0 || *bits > 256 || bits % 8 != 0 {
            return Err(abi_decode_error(base, "unsupported integer width", FUNCTION));
        }
    }

    match value_type {
        AbiType::Uint(bits) => {
            let word = read_word(data, 0, base)?;
            let number = BigUint::from_bytes_be(&word);
            if number.bits() > *bits as u64 {
                return Err(abi_decode_error(base, "uint wider than its type", FUNCTION));
            }
            Ok(AbiValue::Uint(*bits, number))
        }
        AbiType::Int(bits) => {
            let word = read_word(data, 0, base)?;
            let number = BigInt::from_signed_bytes_be(&word);
            // The word must be the sign extension of its low `bits` bits
            let fill = if word[0] & 0x80 != 0 { 0xFF } else { 0x00 };
            let width = bits / 8;
            let sign_ok = width == 32 || (word[32 - width] & 0x80 != 0) == (fill == 0xFF);
            if !sign_ok || word[..32 - width].iter().any(|b| *b != fill) {
                return Err(abi_decode_error(base, "int not sign-extended", FUNCTION));
            }
            Ok(AbiValue::Int(*bits, number))
        }
        AbiType::Bool => {
            let word = read_word(data, 0, base)?;
            match word_to_u64(&word) {
                Some(0) => Ok(AbiValue::Bool(false)),
                Some(1) => Ok(AbiValue::Bool(true)),
                _ => Err(abi_decode_error(base, "bool is neither 0 nor 1", FUNCTION)),
            }
        }
        AbiType::Address => {
            let word = read_word(data, 0, base)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(abi_decode_error(base, "address has dirty high bytes", FUNCTION));
            }
            let mut address = [0u8; 20];
            address.copy_from_slice(&word[12..]);
            Ok(AbiValue::Address(address))
        }
        AbiType::FixedBytes(len) => {
            let word = read_word(data, 0, base)?;
            if *len == 0 || *len > 32 || word[*len..].iter().any(|b| *b != 0) {
                return Err(abi_decode_error(base, "bytesN has dirty padding", FUNCTION));
            }
            Ok(AbiValue::FixedBytes(word[..*len].to_vec()))
        }
        AbiType::Bytes => Ok(AbiValue::Bytes(read_dynamic_bytes(data, base)?.to_vec())),
        AbiType::String => {
            let bytes = read_dynamic_bytes(data, base)?;
            String::from_utf8(bytes.to_vec())
                .map(AbiValue::String)
                .map_err(|_| abi_decode_error(base + 32, "string is not UTF-8", FUNCTION))
        }
        AbiType::Array(element_type) => {
            let len = read_length(data, 0, base)?;
            let available = data.len() - 32;
            // Each element needs at least its head; refuse lengths the buffer cannot hold
            if len
                .checked_mul(element_type.head_size().max(1))
                .map_or(true, |needed| needed > available)
            {
                return Err(abi_decode_error(base, "array length exceeds buffer", FUNCTION));
            }
            let types = vec![(**element_type).clone(); len];
            let items = decode_sequence(&types, &data[32..], base + 32)?;
            Ok(AbiValue::Array((**element_type).clone(), items))
        }
        AbiType::FixedArray(element_type, len) => {
            if len.saturating_mul(element_type.head_size().max(1)) > data.len() {
                return Err(abi_decode_error(base, "fixed array exceeds buffer", FUNCTION));
            }
            let types = vec![(**element_type).clone(); *len];
            let items = decode_sequence(&types, data, base)?;
            Ok(AbiValue::FixedArray((**element_type).clone(), items))
        }
        AbiType::Tuple(members) => Ok(AbiValue::Tuple(decode_sequence(members, data, base)?)),
    }
}

fn read_word(data: &[u8], position: usize, base: usize) -> HostFunctionResult<Bytes32> {
    let end = position
        .checked_add(32)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| abi_decode_error(base + position, "word read past end of buffer", FUNCTION))?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[position..end]);
    Ok(word)
}

/// A word used as an offset or length, which must fit in `usize`
fn read_length(data: &[u8], position: usize, base: usize) -> HostFunctionResult<usize> {
    let word = read_word(data, position, base)?;
    word_to_u64(&word)
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| abi_decode_error(base + position, "offset or length too large", FUNCTION))
}

fn read_dynamic_bytes(data: &[u8], base: usize) -> HostFunctionResult<&[u8]> {
    let len = read_length(data, 0, base)?;
    let end = len
        .checked_add(32)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| abi_decode_error(base, "length runs past end of buffer", FUNCTION))?;
    Ok(&data[32..end])
}
