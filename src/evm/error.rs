// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Error Handling System for the Compatibility Runtime
//!
//! Every fallible runtime operation returns [`HostFunctionResult`]. Errors carry
//! the name of the function that raised them so a rejected transaction can be
//! reported with a readable reason.
//!
//! # Error Categories
//!
//! - **Memory Errors** - Access beyond the addressable range of a frame
//! - **Parameter Errors** - Invalid function parameters (too many topics, bad type strings)
//! - **ABI Errors** - Malformed offsets or lengths while decoding
//! - **Gas Errors** - Frame budget exhausted
//! - **Storage Errors** - Host store returned an unusable value
//! - **Call Errors** - Dispatch failures, depth limit
//! - **Write Protection** - State mutation attempted inside a read-only call
//! - **Revert** - Explicit revert by contract code; the only non-fatal variant
//!
//! # Usage
//!
//! ```rust
//! use evm_compat::evm::error::*;
//!
//! let err = gas_error("Insufficient gas", "storage_store", 5000, 100);
//! assert!(err.is_fatal());
//! assert_eq!(err.category(), "gas");
//! ```

use thiserror::Error;

use crate::evm::abi;

/// Result type for runtime operations
pub type HostFunctionResult<T> = Result<T, HostFunctionError>;

/// Errors that can occur while executing contract logic against the runtime
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostFunctionError {
    /// Memory access outside the addressable range
    #[error("[{function}] Memory out of bounds at offset {offset} length {length}: {message}")]
    OutOfBounds {
        offset: u64,
        length: u64,
        message: String,
        function: String,
    },
    /// Invalid parameter provided to function
    #[error("[{function}] Invalid parameter '{param}' with value '{value}': {message}")]
    InvalidParameter {
        param: String,
        value: String,
        message: String,
        function: String,
    },
    /// Malformed ABI payload
    #[error("[{function}] ABI decode error at byte {position}: {message}")]
    AbiDecode {
        position: usize,
        message: String,
        function: String,
    },
    /// Budget exhausted
    #[error("[{function}] Gas error: {message} (requested: {gas_requested}, available: {gas_available})")]
    GasError {
        message: String,
        function: String,
        gas_requested: u64,
        gas_available: u64,
    },
    /// Storage operation error
    #[error("[{function}] Storage error for key '{key}': {message}")]
    StorageError {
        message: String,
        function: String,
        key: String,
    },
    /// Contract call error
    #[error("[{function}] Call error to address '{target_address}': {message}")]
    CallError {
        message: String,
        function: String,
        target_address: String,
    },
    /// State mutation attempted during a read-only call
    #[error("[{function}] Write protection: {message}")]
    WriteProtection { message: String, function: String },
    /// Explicit revert raised by contract code, carrying the revert payload
    #[error("[{function}] Execution reverted ({} bytes of revert data)", .data.len())]
    Reverted { data: Vec<u8>, function: String },
    /// General execution error
    #[error("[{function}] Execution error: {message}")]
    ExecutionError { message: String, function: String },
}

/// Helper function to create out of bounds error
pub fn out_of_bounds_error(offset: u64, length: u64, function: &str) -> HostFunctionError {
    HostFunctionError::OutOfBounds {
        offset,
        length,
        message: format!("Out of bounds in {}", function),
        function: function.to_string(),
    }
}

/// Helper function to create invalid parameter error
pub fn invalid_parameter_error(param: &str, value: &str, function: &str) -> HostFunctionError {
    HostFunctionError::InvalidParameter {
        param: param.to_string(),
        value: value.to_string(),
        message: format!("Invalid parameter in {}", function),
        function: function.to_string(),
    }
}

/// Helper function to create ABI decode error
pub fn abi_decode_error(position: usize, message: &str, function: &str) -> HostFunctionError {
    HostFunctionError::AbiDecode {
        position,
        message: message.to_string(),
        function: function.to_string(),
    }
}

/// Helper function to create execution error
pub fn execution_error(message: &str, function: &str) -> HostFunctionError {
    HostFunctionError::ExecutionError {
        message: message.to_string(),
        function: function.to_string(),
    }
}

/// Helper function to create gas error
pub fn gas_error(
    message: &str,
    function: &str,
    gas_requested: u64,
    gas_available: u64,
) -> HostFunctionError {
    HostFunctionError::GasError {
        message: message.to_string(),
        function: function.to_string(),
        gas_requested,
        gas_available,
    }
}

/// Helper function to create storage error
pub fn storage_error(message: &str, function: &str, key: &str) -> HostFunctionError {
    HostFunctionError::StorageError {
        message: message.to_string(),
        function: function.to_string(),
        key: key.to_string(),
    }
}

/// Helper function to create call error
pub fn call_error(message: &str, function: &str, target_address: &str) -> HostFunctionError {
    HostFunctionError::CallError {
        message: message.to_string(),
        function: function.to_string(),
        target_address: target_address.to_string(),
    }
}

/// Helper function to create write protection error
pub fn write_protection_error(message: &str, function: &str) -> HostFunctionError {
    HostFunctionError::WriteProtection {
        message: message.to_string(),
        function: function.to_string(),
    }
}

/// Helper function to create a revert carrying raw revert data
pub fn revert_error(data: Vec<u8>, function: &str) -> HostFunctionError {
    HostFunctionError::Reverted {
        data,
        function: function.to_string(),
    }
}

/// Helper function to create a revert carrying an `Error(string)` reason
pub fn revert_with_reason(reason: &str, function: &str) -> HostFunctionError {
    revert_error(abi::encode_revert_reason(reason), function)
}

impl HostFunctionError {
    /// Get the function name where this error occurred
    pub fn function(&self) -> &str {
        match self {
            HostFunctionError::OutOfBounds { function, .. } => function,
            HostFunctionError::InvalidParameter { function, .. } => function,
            HostFunctionError::AbiDecode { function, .. } => function,
            HostFunctionError::GasError { function, .. } => function,
            HostFunctionError::StorageError { function, .. } => function,
            HostFunctionError::CallError { function, .. } => function,
            HostFunctionError::WriteProtection { function, .. } => function,
            HostFunctionError::Reverted { function, .. } => function,
            HostFunctionError::ExecutionError { function, .. } => function,
        }
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        match self {
            HostFunctionError::OutOfBounds { message, .. } => message,
            HostFunctionError::InvalidParameter { message, .. } => message,
            HostFunctionError::AbiDecode { message, .. } => message,
            HostFunctionError::GasError { message, .. } => message,
            HostFunctionError::StorageError { message, .. } => message,
            HostFunctionError::CallError { message, .. } => message,
            HostFunctionError::WriteProtection { message, .. } => message,
            HostFunctionError::Reverted { .. } => "execution reverted",
            HostFunctionError::ExecutionError { message, .. } => message,
        }
    }

    /// Get error category as string
    pub fn category(&self) -> &'static str {
        match self {
            HostFunctionError::OutOfBounds { .. } => "memory",
            HostFunctionError::InvalidParameter { .. } => "parameter",
            HostFunctionError::AbiDecode { .. } => "abi",
            HostFunctionError::GasError { .. } => "gas",
            HostFunctionError::StorageError { .. } => "storage",
            HostFunctionError::CallError { .. } => "call",
            HostFunctionError::WriteProtection { .. } => "write_protection",
            HostFunctionError::Reverted { .. } => "revert",
            HostFunctionError::ExecutionError { .. } => "execution",
        }
    }

    /// Everything except an explicit revert aborts the frame that raised it
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HostFunctionError::Reverted { .. })
    }

    /// Human-readable reason for reporting a rejected invocation.
    ///
    /// Reverts carrying an `Error(string)` payload yield the decoded string.
    pub fn reason(&self) -> String {
        match self {
            HostFunctionError::Reverted { data, .. } => abi::decode_revert_reason(data)
                .unwrap_or_else(|| "execution reverted".to_string()),
            other => other.to_string(),
        }
    }

    /// Payload handed back to the caller of a failed frame
    pub fn into_return_data(self) -> Vec<u8> {
        match self {
            HostFunctionError::Reverted { data, .. } => data,
            other => abi::encode_revert_reason(&other.to_string()),
        }
    }
}
