// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! ABI encoding

use num_bigint::{BigInt, Sign};
use num_traits::One;

use super::{AbiType, AbiValue};
use crate::evm::error::{invalid_parameter_error, HostFunctionResult};
use crate::evm::utils::word_from_usize;

/// Encode a parameter list with the head/tail layout.
///
/// Fails if a value does not fit its declared width or an array holds an
/// element of the wrong type. An empty list encodes to zero bytes.
pub fn encode(values: &[AbiValue]) -> HostFunctionResult<Vec<u8>> {
    encode_sequence(values)
}

fn encode_sequence(values: &[AbiValue]) -> HostFunctionResult<Vec<u8>> {
    let types: Vec<AbiType> = values.iter().map(AbiValue::abi_type).collect();
    let head_size: usize = types.iter().map(AbiType::head_size).sum();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();
    let mut placeholders = Vec::new();

    for (value, value_type) in values.iter().zip(&types) {
        if value_type.is_dynamic() {
            placeholders.push((head.len(), tail.len()));
            head.extend_from_slice(&[0u8; 32]);
            tail.extend(encode_value(value)?);
        } else {
            head.extend(encode_value(value)?);
        }
    }

    for (position, tail_offset) in placeholders {
        head[position..position + 32].copy_from_slice(&word_from_usize(head_size + tail_offset));
    }

    head.extend(tail);
    Ok(head)
}

fn encode_value(value: &AbiValue) -> HostFunctionResult<Vec<u8>> {
    if let AbiValue::Uint(bits, _) | AbiValue::Int(bits, _) = value {
        if *bits == 0 || *bits > 256 || bits % 8 != 0 {
            return Err(invalid_parameter_error("bits", &bits.to_string(), "abi_encode"));
        }
    }

    match value {
        AbiValue::Uint(bits, number) => {
            if number.bits() > *bits as u64 {
                return Err(invalid_parameter_error(
                    &format!("uint{}", bits),
                    &number.to_string(),
                    "abi_encode",
                ));
            }
            let bytes = number.to_bytes_be();
            let mut word = vec![0u8; 32 - bytes.len()];
            word.extend(bytes);
            Ok(word)
        }
        AbiValue::Int(bits, number) => encode_signed(*bits, number),
        AbiValue::Bool(flag) => Ok(word_from_usize(usize::from(*flag)).to_vec()),
        AbiValue::Address(address) => {
            let mut word = vec![0u8; 12];
            word.extend_from_slice(address);
            Ok(word)
        }
        AbiValue::FixedBytes(bytes) => {
            if bytes.is_empty() || bytes.len() > 32 {
                return Err(invalid_parameter_error(
                    "bytesN",
                    &bytes.len().to_string(),
                    "abi_encode",
                ));
            }
            let mut word = bytes.clone();
            word.resize(32, 0);
            Ok(word)
        }
        AbiValue::Bytes(bytes) => Ok(encode_dynamic_bytes(bytes)),
        AbiValue::String(text) => Ok(encode_dynamic_bytes(text.as_bytes())),
        AbiValue::Array(element_type, items) => {
            check_elements(element_type, items)?;
            let mut encoded = word_from_usize(items.len()).to_vec();
            encoded.extend(encode_sequence(items)?);
            Ok(encoded)
        }
        AbiValue::FixedArray(element_type, items) => {
            check_elements(element_type, items)?;
            encode_sequence(items)
        }
        AbiValue::Tuple(items) => encode_sequence(items),
    }
}

/// Length word followed by the content right-padded to a word boundary
pub(super) fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(32) * 32;
    let mut encoded = Vec::with_capacity(32 + padded);
    encoded.extend_from_slice(&word_from_usize(bytes.len()));
    encoded.extend_from_slice(bytes);
    encoded.resize(32 + padded, 0);
    encoded
}

/// Two's complement word, sign-extended from `bits`
fn encode_signed(bits: usize, number: &BigInt) -> HostFunctionResult<Vec<u8>> {
    let bound = BigInt::one() << (bits - 1);
    if *number >= bound || *number < -bound {
        return Err(invalid_parameter_error(
            &format!("int{}", bits),
            &number.to_string(),
            "abi_encode",
        ));
    }

    let bytes = number.to_signed_bytes_be();
    let fill = if number.sign() == Sign::Minus { 0xFF } else { 0x00 };
    let mut word = vec![fill; 32 - bytes.len()];
    word.extend(bytes);
    Ok(word)
}

fn check_elements(element_type: &AbiType, items: &[AbiValue]) -> HostFunctionResult<()> {
    match items.iter().find(|item| item.abi_type() != *element_type) {
        Some(item) => Err(invalid_parameter_error(
            &element_type.canonical_name(),
            &item.abi_type().canonical_name(),
            "abi_encode",
        )),
        None => Ok(()),
    }
}
