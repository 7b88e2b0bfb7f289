// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use ethabi::{decode, ParamType, Token};

/// Helper function to decode uint256 from return data
pub fn decode_uint256(data: &[u8]) -> Result<u64, String> {
    if data.len() < 32 {
        return Err("Data too short for uint256".to_string());
    }

    // Take last 8 bytes for u64 (assuming the value fits in u64)
    let bytes: [u8; 8] = data[24..32].try_into().map_err(|_| "Invalid uint256")?;
    Ok(u64::from_be_bytes(bytes))
}

/// Helper function to decode ABI-encoded string from return data
pub fn decode_abi_string(data: &[u8]) -> Result<String, String> {
    match decode(&[ParamType::String], data).map_err(|e| e.to_string())?.pop() {
        Some(Token::String(value)) => Ok(value),
        other => Err(format!("Unexpected token {:?}", other)),
    }
}

/// Helper function to decode address from return data
pub fn decode_address(data: &[u8]) -> Result<[u8; 20], String> {
    if data.len() < 32 {
        return Err("Data too short for address".to_string());
    }

    // Take last 20 bytes for address
    let bytes: [u8; 20] = data[12..32].try_into().map_err(|_| "Invalid address")?;
    Ok(bytes)
}

/// Helper function to decode boolean from return data
pub fn decode_bool(data: &[u8]) -> Result<bool, String> {
    if data.len() < 32 {
        return Err("Data too short for bool".to_string());
    }

    Ok(data[31] != 0)
}

/// Helper function to decode (bool, bytes) return data from contract calls
pub fn decode_call_result(data: &[u8]) -> Result<(bool, Vec<u8>), String> {
    let mut tokens = decode(&[ParamType::Bool, ParamType::Bytes], data).map_err(|e| e.to_string())?;
    match (tokens.pop(), tokens.pop()) {
        (Some(Token::Bytes(bytes)), Some(Token::Bool(success))) => Ok((success, bytes)),
        other => Err(format!("Unexpected tokens {:?}", other)),
    }
}

/// Reason string of an `Error(string)` revert payload
pub fn decode_revert_message(data: &[u8]) -> Result<String, String> {
    if data.len() < 4 || data[..4] != [0x08, 0xc3, 0x79, 0xa0] {
        return Err("Not an Error(string) payload".to_string());
    }
    decode_abi_string(&data[4..])
}
