// Copyright (C) 2021-2025 the DTVM authors. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Host Functions
//!
//! Offset-based entry points in the style of the foreign model's opcodes.
//! Every function takes the calling [`Frame`](crate::evm::frame::Frame) and
//! addresses its Memory Region by byte offset; memory growth and operation
//! costs are charged to the frame.
//!
//! - **Context**: Identity, value, call data and block information
//! - **Storage**: Contract storage operations
//! - **Crypto**: Hashing and signer recovery
//! - **Math**: Modular arithmetic
//! - **Contract**: Contract interaction (calls, creation)
//! - **Control**: Execution control (finish, revert, return data)
//! - **Log**: Event logging and emission
//!
//! # Usage
//!
//! ```rust,ignore
//! use evm_compat::evm::host_functions::*;
//!
//! storage_load(frame, key_offset, result_offset)?;
//! ```

pub mod context;
pub mod contract;
pub mod control;
pub mod crypto;
pub mod log;
pub mod math;
pub mod storage;

pub use context::{
    call_data_copy, get_address, get_block_number, get_block_timestamp, get_call_data_size,
    get_call_value, get_caller, get_tx_origin,
};

pub use storage::{storage_load, storage_store};

pub use crypto::{ecrecover, keccak256, sha256};

pub use math::{addmod, expmod, mulmod};

pub use contract::{call_contract, call_delegate, call_static, create_contract};

pub use control::{finish, get_return_data_size, invalid, return_data_copy, revert};

pub use log::{emit_log0, emit_log1, emit_log2, emit_log3, emit_log4, emit_log_event};
