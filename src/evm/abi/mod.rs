// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Value Codec (ABI)
//!
//! Encodes typed value trees into the foreign model's 32-byte-word wire format
//! and back.
//!
//! # Layout
//!
//! A parameter list is laid out as a head followed by a tail:
//!
//! - Static values (`uintN`, `intN`, `bool`, `address`, `bytesN`, and fixed
//!   arrays or tuples made only of those) are written in place in the head.
//! - Dynamic values (`bytes`, `string`, `T[]`, and fixed arrays or tuples
//!   containing one) leave a 32-byte offset in the head; their payload goes to
//!   the tail. Offsets are relative to the start of the enclosing list.
//! - `bytes` and `string` payloads are a length word followed by the content
//!   right-padded to a 32-byte boundary.
//!
//! # Usage
//!
//! ```rust
//! use evm_compat::evm::abi::{decode, encode, AbiType, AbiValue};
//!
//! let values = vec![AbiValue::uint(1000), AbiValue::String("hi".into())];
//! let encoded = encode(&values).unwrap();
//! assert_eq!(encoded.len(), 4 * 32);
//!
//! let decoded = decode(&[AbiType::Uint(256), AbiType::String], &encoded).unwrap();
//! assert_eq!(decoded, values);
//! ```

mod decode;
mod encode;

pub use decode::decode;
pub use encode::encode;

use num_bigint::{BigInt, BigUint};

use crate::evm::crypto::keccak256;
use crate::evm::error::{abi_decode_error, invalid_parameter_error, HostFunctionResult};
use crate::evm::utils::{word_from_usize, Address, Bytes32};

/// Selector of the standard `Error(string)` revert payload
pub const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Type descriptor of one ABI value
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// `uintN`, N in bits
    Uint(usize),
    /// `intN`, N in bits
    Int(usize),
    Bool,
    Address,
    /// `bytesN`, N in bytes
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`
    Array(Box<AbiType>),
    /// `T[N]`
    FixedArray(Box<AbiType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// True if values of this type live in the tail
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, len) => *len > 0 && inner.is_dynamic(),
            AbiType::Tuple(members) => members.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of its enclosing list
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            AbiType::FixedArray(inner, len) => inner.head_size().saturating_mul(*len),
            AbiType::Tuple(members) => members
                .iter()
                .map(AbiType::head_size)
                .fold(0, usize::saturating_add),
            _ => 32,
        }
    }

    /// Name used in function and event signatures
    pub fn canonical_name(&self) -> String {
        match self {
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::Int(bits) => format!("int{}", bits),
            AbiType::Bool => "bool".to_string(),
            AbiType::Address => "address".to_string(),
            AbiType::FixedBytes(len) => format!("bytes{}", len),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::Array(inner) => format!("{}[]", inner.canonical_name()),
            AbiType::FixedArray(inner, len) => format!("{}[{}]", inner.canonical_name(), len),
            AbiType::Tuple(members) => {
                let names: Vec<String> = members.iter().map(AbiType::canonical_name).collect();
                format!("({})", names.join(","))
            }
        }
    }

    /// Parse a type name such as `uint256`, `bytes32[]` or `(address,uint8)[2]`
    pub fn parse(name: &str) -> HostFunctionResult<AbiType> {
        let name = name.trim();

        if let Some(without_bracket) = name.strip_suffix(']') {
            let open = without_bracket
                .rfind('[')
                .ok_or_else(|| invalid_parameter_error("type", name, "abi_type_parse"))?;
            let inner = AbiType::parse(&without_bracket[..open])?;
            let dimension = &without_bracket[open + 1..];
            if dimension.is_empty() {
                return Ok(AbiType::Array(Box::new(inner)));
            }
            let len: usize = dimension
                .parse()
                .map_err(|_| invalid_parameter_error("type", name, "abi_type_parse"))?;
            if len == 0 {
                return Err(invalid_parameter_error("type", name, "abi_type_parse"));
            }
            return Ok(AbiType::FixedArray(Box::new(inner), len));
        }

        if let Some(body) = name.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
            let members = split_top_level(body)
                .into_iter()
                .map(AbiType::parse)
                .collect::<HostFunctionResult<Vec<_>>>()?;
            return Ok(AbiType::Tuple(members));
        }

        match name {
            "bool" => return Ok(AbiType::Bool),
            "address" => return Ok(AbiType::Address),
            "bytes" => return Ok(AbiType::Bytes),
            "string" => return Ok(AbiType::String),
            "uint" => return Ok(AbiType::Uint(256)),
            "int" => return Ok(AbiType::Int(256)),
            _ => {}
        }

        if let Some(digits) = name.strip_prefix("uint") {
            Ok(AbiType::Uint(parse_size(digits, name, valid_bits)?))
        } else if let Some(digits) = name.strip_prefix("int") {
            Ok(AbiType::Int(parse_size(digits, name, valid_bits)?))
        } else if let Some(digits) = name.strip_prefix("bytes") {
            Ok(AbiType::FixedBytes(parse_size(digits, name, valid_byte_width)?))
        } else {
            Err(invalid_parameter_error("type", name, "abi_type_parse"))
        }
    }
}

fn valid_bits(n: usize) -> bool {
    n > 0 && n <= 256 && n % 8 == 0
}

fn valid_byte_width(n: usize) -> bool {
    n > 0 && n <= 32
}

fn parse_size(digits: &str, name: &str, valid: fn(usize) -> bool) -> HostFunctionResult<usize> {
    digits
        .parse::<usize>()
        .ok()
        .filter(|n| valid(*n))
        .ok_or_else(|| invalid_parameter_error("type", name, "abi_type_parse"))
}

/// Split a comma-separated list, ignoring commas nested in parentheses
fn split_top_level(list: &str) -> Vec<&str> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// A typed ABI value tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    Uint(usize, BigUint),
    Int(usize, BigInt),
    Bool(bool),
    Address(Address),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// Dynamic array; the element type is kept so empty arrays stay typed
    Array(AbiType, Vec<AbiValue>),
    FixedArray(AbiType, Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// `uint256` from a native integer
    pub fn uint(value: u64) -> Self {
        AbiValue::Uint(256, BigUint::from(value))
    }

    /// `int256` from a native integer
    pub fn int(value: i64) -> Self {
        AbiValue::Int(256, BigInt::from(value))
    }

    /// `bytes32` from a word
    pub fn word(value: &Bytes32) -> Self {
        AbiValue::FixedBytes(value.to_vec())
    }

    pub fn abi_type(&self) -> AbiType {
        match self {
            AbiValue::Uint(bits, _) => AbiType::Uint(*bits),
            AbiValue::Int(bits, _) => AbiType::Int(*bits),
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::FixedBytes(bytes) => AbiType::FixedBytes(bytes.len()),
            AbiValue::Bytes(_) => AbiType::Bytes,
            AbiValue::String(_) => AbiType::String,
            AbiValue::Array(inner, _) => AbiType::Array(Box::new(inner.clone())),
            AbiValue::FixedArray(inner, items) => {
                AbiType::FixedArray(Box::new(inner.clone()), items.len())
            }
            AbiValue::Tuple(items) => AbiType::Tuple(items.iter().map(AbiValue::abi_type).collect()),
        }
    }

    pub fn as_uint(&self) -> Option<&BigUint> {
        match self {
            AbiValue::Uint(_, value) => Some(value),
            _ => None,
        }
    }

    /// Unsigned value narrowed to `u64`, `None` if wider
    pub fn as_u64(&self) -> Option<u64> {
        self.as_uint().and_then(|value| u64::try_from(value).ok())
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            AbiValue::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(bytes) | AbiValue::FixedBytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(_, items) | AbiValue::FixedArray(_, items) | AbiValue::Tuple(items) => {
                Some(items)
            }
            _ => None,
        }
    }
}

/// First 4 bytes of `hash256(signature)`
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Topic 0 of an event: the full hash of its signature
pub fn event_topic(signature: &str) -> Bytes32 {
    keccak256(signature.as_bytes())
}

/// Parameter types of a signature such as `transfer(address,uint256)`
pub fn signature_types(signature: &str) -> HostFunctionResult<Vec<AbiType>> {
    let open = signature
        .find('(')
        .ok_or_else(|| invalid_parameter_error("signature", signature, "signature_types"))?;
    match AbiType::parse(&signature[open..])? {
        AbiType::Tuple(members) => Ok(members),
        _ => Err(invalid_parameter_error("signature", signature, "signature_types")),
    }
}

/// Selector followed by the encoded arguments.
///
/// Argument types must match the signature exactly.
pub fn encode_call(signature: &str, values: &[AbiValue]) -> HostFunctionResult<Vec<u8>> {
    let types = signature_types(signature)?;
    let actual: Vec<AbiType> = values.iter().map(AbiValue::abi_type).collect();
    if types != actual {
        let names: Vec<String> = actual.iter().map(AbiType::canonical_name).collect();
        return Err(invalid_parameter_error(
            "values",
            &format!("({})", names.join(",")),
            "encode_call",
        ));
    }

    let mut call = function_selector(signature).to_vec();
    call.extend(encode(values)?);
    Ok(call)
}

/// Check the selector of `input` against `signature` and decode the arguments
pub fn decode_call_input(signature: &str, input: &[u8]) -> HostFunctionResult<Vec<AbiValue>> {
    if input.len() < 4 {
        return Err(abi_decode_error(input.len(), "input shorter than a selector", "decode_call_input"));
    }
    if input[..4] != function_selector(signature) {
        return Err(abi_decode_error(0, "selector mismatch", "decode_call_input"));
    }
    decode(&signature_types(signature)?, &input[4..])
}

/// `Error(string)` revert payload carrying `reason`
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    let mut payload = REVERT_SELECTOR.to_vec();
    payload.extend_from_slice(&word_from_usize(32));
    payload.extend(encode::encode_dynamic_bytes(reason.as_bytes()));
    payload
}

/// Reason string of an `Error(string)` revert payload
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != REVERT_SELECTOR {
        return None;
    }
    match decode(&[AbiType::String], &data[4..]).ok()?.pop()? {
        AbiValue::String(reason) => Some(reason),
        _ => None,
    }
}
